//! OpenAPI component schemas of the REST surface

use super::dto::*;
use super::error::Problem;
use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Enrollment Ledger API"),
    components(schemas(
        ShiftDto,
        EnrollmentStatusDto,
        AttendanceStatusDto,
        AuditActionDto,
        ClassDto,
        CreateClassRequest,
        StudentDto,
        CreateStudentRequest,
        EnrollmentDto,
        CreateEnrollmentRequest,
        TransferEnrollmentRequest,
        SeatLedgerDto,
        AttendanceDto,
        RecordAttendanceRequest,
        AttendanceEntryDto,
        BulkAttendanceRequest,
        BulkAttendanceResponse,
        UpdateAttendanceRequest,
        AttendanceReportDto,
        AuditLogDto,
        AuditStatsDto,
        Problem,
    ))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
