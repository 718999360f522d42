/// Liveness probe
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    responses((status = 200, description = "Service is up", body = String)),
)]
pub async fn healthz() -> &'static str {
    "OK"
}
