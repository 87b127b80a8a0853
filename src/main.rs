use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use medref_core::auth::{Credential, SessionService};
use medref_core::hospital::{Hospital, HospitalDirectory, HospitalInput};
use medref_core::patient::{Patient, PatientDirectory, PatientInput, PatientQuery};
use medref_core::referral::{PatientSelector, ReferralDetails, ScheduleDetails};
use medref_core::store::ReferralStore;
use medref_core::users::{NewUser, User, UserDirectory, UserUpdate};
use medref_core::workflow::{Decision, LiaisonWorkflow, ReferralWorkflow};
use medref_core::{
    Actor, CoreConfig, Referral, ReferralError, SlaPolicy, Urgency,
    config::sla_hours_from_env_value,
};
use medref_types::EmailAddress;

/// Application state shared across REST API handlers
///
/// Holds every directory and workflow service; all of them are cheap
/// clones over shared state, so the whole struct is Clone.
#[derive(Clone)]
struct AppState {
    users: UserDirectory,
    sessions: SessionService,
    patients: PatientDirectory,
    hospitals: HospitalDirectory,
    referrals: ReferralWorkflow,
    liaison: LiaisonWorkflow,
}

impl AppState {
    /// Resolves the `Authorization: Bearer` header to an acting user.
    fn authenticate(&self, headers: &HeaderMap) -> Result<Actor, ApiError> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| {
                ApiError(ReferralError::Unauthenticated("missing bearer token".into()))
            })?;

        let actor = self
            .sessions
            .authenticate(&Credential::from_token(token), &self.users)?;
        Ok(actor)
    }
}

/// Wire error wrapper mapping the domain taxonomy onto HTTP status codes.
struct ApiError(ReferralError);

impl From<ReferralError> for ApiError {
    fn from(err: ReferralError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ReferralError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ReferralError::Forbidden(_) => StatusCode::FORBIDDEN,
            ReferralError::NotFound { .. } => StatusCode::NOT_FOUND,
            ReferralError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ReferralError::InvalidTransition { .. } | ReferralError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            _ => {
                tracing::error!("storage failure: {:?}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = match &self.0 {
            ReferralError::Validation(fields) => {
                json!({ "error": self.0.to_string(), "fields": fields })
            }
            _ => json!({ "error": self.0.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize, ToSchema)]
struct HealthRes {
    status: String,
}

#[derive(Deserialize, ToSchema)]
struct LoginReq {
    email: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct LoginRes {
    token: String,
    #[schema(value_type = Object)]
    user: User,
}

/// Exactly one search key per request.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct PatientSearchReq {
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    national_id: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct CreateReferralReq {
    /// Existing patient reference; wins over `patient` when both are set.
    #[serde(default)]
    patient_id: Option<Uuid>,
    /// Registration payload for a patient not yet in the directory.
    #[serde(default)]
    #[schema(value_type = Object)]
    patient: Option<PatientInput>,
    #[schema(value_type = String)]
    urgency: Urgency,
    #[serde(default)]
    reason_for_referral: String,
    #[serde(default)]
    clinical_notes: Option<String>,
    #[serde(default)]
    required_specialty: Option<String>,
    #[serde(default)]
    required_bed_type: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct SendReq {
    to_hospital: Uuid,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct ScheduleReq {
    scheduled_for: DateTime<Utc>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct DecideReq {
    #[schema(value_type = String)]
    decision: Decision,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Serialize, ToSchema)]
struct ResetPasswordRes {
    token: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        login,
        search_patients,
        find_or_create_patient,
        create_referral,
        send_referral,
        decide_referral,
        schedule_referral,
        check_in_referral,
        complete_referral,
        my_referrals,
        incoming_referrals,
        list_referrals,
        get_referral,
        list_hospitals,
        create_hospital,
        list_users,
        create_user,
        update_user,
        delete_user,
        reset_password
    ),
    components(schemas(
        HealthRes,
        LoginReq,
        LoginRes,
        PatientSearchReq,
        CreateReferralReq,
        SendReq,
        ScheduleReq,
        DecideReq,
        ResetPasswordRes
    ))
)]
struct ApiDoc;

/// Main entry point for the referral service
///
/// Serves the REST API and the Swagger UI.
///
/// # Environment Variables
/// - `MEDREF_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `MEDREF_DATA_DIR`: Directory for record storage (default: "./medref_data")
/// - `MEDREF_SLA_ROUTINE_HOURS`: expiry window for routine referrals (default: 720)
/// - `MEDREF_SLA_URGENT_HOURS`: expiry window for urgent referrals (default: 168)
/// - `MEDREF_SLA_EMERGENCY_HOURS`: expiry window for emergency referrals (default: 24)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medref=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("MEDREF_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = std::env::var("MEDREF_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./medref_data"));

    let defaults = SlaPolicy::default();
    let sla = SlaPolicy {
        routine: sla_hours_from_env_value(
            std::env::var("MEDREF_SLA_ROUTINE_HOURS").ok(),
            defaults.routine,
        )?,
        urgent: sla_hours_from_env_value(
            std::env::var("MEDREF_SLA_URGENT_HOURS").ok(),
            defaults.urgent,
        )?,
        emergency: sla_hours_from_env_value(
            std::env::var("MEDREF_SLA_EMERGENCY_HOURS").ok(),
            defaults.emergency,
        )?,
    };

    let cfg = Arc::new(CoreConfig::new(data_dir, sla)?);

    let store = ReferralStore::open(cfg.clone())?;
    let patients = PatientDirectory::open(cfg.clone())?;
    let hospitals = HospitalDirectory::open(cfg.clone())?;
    let users = UserDirectory::open(cfg.clone())?;

    let state = AppState {
        users,
        sessions: SessionService::new(),
        patients: patients.clone(),
        hospitals: hospitals.clone(),
        referrals: ReferralWorkflow::new(store.clone(), patients, hospitals),
        liaison: LiaisonWorkflow::new(store),
    };

    tracing::info!("++ Starting medref REST on {}", rest_addr);

    let app = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/patients/search", post(search_patients))
        .route("/patients/find-or-create", post(find_or_create_patient))
        .route("/referrals", get(list_referrals).post(create_referral))
        .route("/referrals/my", get(my_referrals))
        .route("/referrals/incoming", get(incoming_referrals))
        .route("/referrals/:id", get(get_referral))
        .route("/referrals/:id/send", patch(send_referral))
        .route("/referrals/:id/decide", patch(decide_referral))
        .route("/referrals/:id/schedule", patch(schedule_referral))
        .route("/referrals/:id/check-in", patch(check_in_referral))
        .route("/referrals/:id/complete", patch(complete_referral))
        .route("/hospitals", get(list_hospitals).post(create_hospital))
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", patch(update_user).delete(delete_user))
        .route("/users/:id/reset-password", patch(reset_password))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Credential issued", body = LoginRes),
        (status = 401, description = "Unknown or inactive account"),
        (status = 422, description = "Malformed email")
    )
)]
/// Issue a bearer credential for an account
///
/// Looks the account up by email and issues a fresh session credential.
/// The response never distinguishes an unknown account from a
/// deactivated one.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> Result<Json<LoginRes>, ApiError> {
    let email =
        EmailAddress::new(&req.email).map_err(|_| ReferralError::invalid("email"))?;

    let user = state
        .users
        .find_by_email(&email)
        .filter(|u| u.is_active)
        .ok_or_else(|| ReferralError::Unauthenticated("invalid credentials".into()))?;

    let credential = state.sessions.issue(user.id);
    tracing::info!("issued credential for {}", user.email);

    Ok(Json(LoginRes {
        token: credential.token().to_string(),
        user,
    }))
}

#[utoipa::path(
    post,
    path = "/patients/search",
    request_body = PatientSearchReq,
    responses(
        (status = 200, description = "Matching patients, oldest first"),
        (status = 401, description = "Missing or invalid credential"),
        (status = 422, description = "Not exactly one search key")
    )
)]
/// Search the patient directory by a single key
async fn search_patients(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PatientSearchReq>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    state.authenticate(&headers)?;

    let mut queries = Vec::new();
    if let Some(phone) = req.phone {
        queries.push(PatientQuery::Phone(phone));
    }
    if let Some(national_id) = req.national_id {
        queries.push(PatientQuery::NationalId(national_id));
    }
    if let Some(full_name) = req.full_name {
        queries.push(PatientQuery::FullName(full_name));
    }

    let mut queries = queries.into_iter();
    let (Some(query), None) = (queries.next(), queries.next()) else {
        return Err(ReferralError::invalid(
            "exactly one of phone, nationalId or fullName",
        )
        .into());
    };

    Ok(Json(state.patients.search(&query)))
}

#[utoipa::path(
    post,
    path = "/patients/find-or-create",
    responses(
        (status = 200, description = "Resolved or newly registered patient"),
        (status = 401, description = "Missing or invalid credential"),
        (status = 422, description = "Missing required fields")
    )
)]
/// Resolve a patient by phone, registering a record on a miss
async fn find_or_create_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<PatientInput>,
) -> Result<Json<Patient>, ApiError> {
    state.authenticate(&headers)?;
    let patient = state.patients.find_or_create(input)?;
    Ok(Json(patient))
}

#[utoipa::path(
    post,
    path = "/referrals",
    request_body = CreateReferralReq,
    responses(
        (status = 201, description = "Referral created as DRAFT"),
        (status = 401, description = "Missing or invalid credential"),
        (status = 403, description = "Actor cannot create referrals"),
        (status = 422, description = "Missing required fields")
    )
)]
/// Create a referral
///
/// The referral is always created as DRAFT with no destination; sending
/// is a separate call even when the client submits straight away.
async fn create_referral(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateReferralReq>,
) -> Result<(StatusCode, Json<Referral>), ApiError> {
    let actor = state.authenticate(&headers)?;

    let selector = match (req.patient_id, req.patient) {
        (Some(id), _) => PatientSelector::Existing(id),
        (None, Some(input)) => PatientSelector::New(input),
        // Validation will list every missing patient field.
        (None, None) => PatientSelector::New(PatientInput::default()),
    };
    let details = ReferralDetails {
        urgency: req.urgency,
        reason_for_referral: req.reason_for_referral,
        clinical_notes: req.clinical_notes,
        required_specialty: req.required_specialty,
        required_bed_type: req.required_bed_type,
    };

    let referral = state.referrals.create_referral(&actor, selector, details)?;
    Ok((StatusCode::CREATED, Json(referral)))
}

#[utoipa::path(
    patch,
    path = "/referrals/{id}/send",
    request_body = SendReq,
    responses(
        (status = 200, description = "Referral sent (DRAFT to PENDING)"),
        (status = 404, description = "Unknown referral or destination hospital"),
        (status = 409, description = "Referral is not a draft"),
        (status = 422, description = "Destination equals origin")
    )
)]
/// Send a draft referral to a destination hospital
async fn send_referral(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<SendReq>,
) -> Result<Json<Referral>, ApiError> {
    let actor = state.authenticate(&headers)?;
    let referral = state.referrals.send_referral(&actor, id, req.to_hospital)?;
    Ok(Json(referral))
}

#[utoipa::path(
    patch,
    path = "/referrals/{id}/decide",
    request_body = DecideReq,
    responses(
        (status = 200, description = "Decision applied"),
        (status = 403, description = "Not a liaison of the destination hospital"),
        (status = 404, description = "Unknown referral"),
        (status = 409, description = "Referral is no longer pending")
    )
)]
/// Accept or reject a pending referral
async fn decide_referral(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<DecideReq>,
) -> Result<Json<Referral>, ApiError> {
    let actor = state.authenticate(&headers)?;
    let referral = state.liaison.decide(&actor, id, req.decision, req.notes)?;
    Ok(Json(referral))
}

#[utoipa::path(
    patch,
    path = "/referrals/{id}/schedule",
    request_body = ScheduleReq,
    responses(
        (status = 200, description = "Appointment booked (ACCEPTED to SCHEDULED)"),
        (status = 403, description = "Not staff of the destination hospital"),
        (status = 404, description = "Unknown referral"),
        (status = 409, description = "Referral is not accepted")
    )
)]
/// Book the appointment for an accepted referral
async fn schedule_referral(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<ScheduleReq>,
) -> Result<Json<Referral>, ApiError> {
    let actor = state.authenticate(&headers)?;
    let details = ScheduleDetails {
        scheduled_for: req.scheduled_for,
        notes: req.notes,
    };
    let referral = state.liaison.schedule(&actor, id, details)?;
    Ok(Json(referral))
}

#[utoipa::path(
    patch,
    path = "/referrals/{id}/check-in",
    responses(
        (status = 200, description = "Patient arrival recorded (SCHEDULED to CHECKED_IN)"),
        (status = 404, description = "Unknown referral"),
        (status = 409, description = "Referral is not scheduled")
    )
)]
/// Record the patient's arrival for a scheduled referral
async fn check_in_referral(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Referral>, ApiError> {
    let actor = state.authenticate(&headers)?;
    let referral = state.liaison.check_in(&actor, id)?;
    Ok(Json(referral))
}

#[utoipa::path(
    patch,
    path = "/referrals/{id}/complete",
    responses(
        (status = 200, description = "Referral closed (CHECKED_IN to COMPLETED)"),
        (status = 404, description = "Unknown referral"),
        (status = 409, description = "Referral is not checked in")
    )
)]
/// Close a referral after the visit
async fn complete_referral(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Referral>, ApiError> {
    let actor = state.authenticate(&headers)?;
    let referral = state.liaison.complete(&actor, id)?;
    Ok(Json(referral))
}

#[utoipa::path(
    get,
    path = "/referrals",
    responses(
        (status = 200, description = "Referrals visible to the actor, oldest first"),
        (status = 401, description = "Missing or invalid credential"),
        (status = 403, description = "Actor lacks the view-all capability")
    )
)]
/// List the referrals within the actor's view
///
/// System admins see the whole store; liaison officers and hospital
/// admins see referrals touching their own hospital.
async fn list_referrals(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Referral>>, ApiError> {
    let actor = state.authenticate(&headers)?;
    Ok(Json(state.referrals.list_all(&actor)?))
}

#[utoipa::path(
    get,
    path = "/referrals/{id}",
    responses(
        (status = 200, description = "The referral"),
        (status = 403, description = "Referral is outside the actor's view"),
        (status = 404, description = "Unknown referral")
    )
)]
/// Fetch one referral visible to the actor
async fn get_referral(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Referral>, ApiError> {
    let actor = state.authenticate(&headers)?;
    Ok(Json(state.referrals.get(&actor, id)?))
}

#[utoipa::path(
    get,
    path = "/referrals/my",
    responses(
        (status = 200, description = "The actor's own referrals, newest first"),
        (status = 401, description = "Missing or invalid credential")
    )
)]
/// List the referrals created by the acting user
async fn my_referrals(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Referral>>, ApiError> {
    let actor = state.authenticate(&headers)?;
    Ok(Json(state.referrals.list_mine(&actor)))
}

#[utoipa::path(
    get,
    path = "/referrals/incoming",
    responses(
        (status = 200, description = "Pending referrals for the actor's hospital, most urgent first"),
        (status = 401, description = "Missing or invalid credential"),
        (status = 403, description = "Actor cannot triage referrals")
    )
)]
/// List the pending queue for the acting liaison's hospital
async fn incoming_referrals(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Referral>>, ApiError> {
    let actor = state.authenticate(&headers)?;
    let queue = state.liaison.list_incoming(&actor)?;
    Ok(Json(queue))
}

#[utoipa::path(
    get,
    path = "/hospitals",
    responses(
        (status = 200, description = "All registered hospitals"),
        (status = 401, description = "Missing or invalid credential")
    )
)]
/// List registered hospitals
async fn list_hospitals(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Hospital>>, ApiError> {
    state.authenticate(&headers)?;
    Ok(Json(state.hospitals.list()))
}

#[utoipa::path(
    post,
    path = "/hospitals",
    responses(
        (status = 201, description = "Hospital registered"),
        (status = 403, description = "Actor cannot manage hospitals"),
        (status = 409, description = "Duplicate hospital name"),
        (status = 422, description = "Missing required fields")
    )
)]
/// Register a hospital (system admins only)
async fn create_hospital(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<HospitalInput>,
) -> Result<(StatusCode, Json<Hospital>), ApiError> {
    let actor = state.authenticate(&headers)?;
    let hospital = state.hospitals.create(&actor, input)?;
    Ok((StatusCode::CREATED, Json(hospital)))
}

#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "User accounts visible to the actor"),
        (status = 403, description = "Actor cannot manage users")
    )
)]
/// List user accounts within the actor's management scope
async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<User>>, ApiError> {
    let actor = state.authenticate(&headers)?;
    Ok(Json(state.users.list(&actor)?))
}

#[utoipa::path(
    post,
    path = "/users",
    responses(
        (status = 201, description = "Account created"),
        (status = 403, description = "Target outside the actor's scope"),
        (status = 409, description = "Duplicate email"),
        (status = 422, description = "Affiliation does not fit the role")
    )
)]
/// Create a user account
async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let actor = state.authenticate(&headers)?;
    let user = state.users.create(&actor, new_user)?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    patch,
    path = "/users/{id}",
    responses(
        (status = 200, description = "Account updated"),
        (status = 403, description = "Target outside the actor's scope"),
        (status = 404, description = "Unknown account")
    )
)]
/// Update a user's name or active flag
async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<User>, ApiError> {
    let actor = state.authenticate(&headers)?;
    let user = state.users.update(&actor, id, update)?;
    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    responses(
        (status = 204, description = "Account deleted and sessions revoked"),
        (status = 403, description = "Target outside the actor's scope"),
        (status = 404, description = "Unknown account")
    )
)]
/// Delete a user account
async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let actor = state.authenticate(&headers)?;
    state.users.delete(&actor, id, &state.sessions)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/users/{id}/reset-password",
    responses(
        (status = 200, description = "Old sessions revoked, fresh credential issued", body = ResetPasswordRes),
        (status = 403, description = "Target outside the actor's scope"),
        (status = 404, description = "Unknown account")
    )
)]
/// Reset a user's credential
///
/// Revokes every session the user holds and returns a fresh credential
/// to the managing admin for out-of-band delivery.
async fn reset_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ResetPasswordRes>, ApiError> {
    let actor = state.authenticate(&headers)?;
    let credential = state.users.reset_password(&actor, id, &state.sessions)?;
    Ok(Json(ResetPasswordRes {
        token: credential.token().to_string(),
    }))
}
