use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, MeResponse, MessageResponse, ProfileResponse,
            PublicUser, RegisterRequest, RegisterResponse, ResendCodeRequest, UpdateProfileRequest,
            VerifyCodeRequest, VerifyEmailQuery,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, validate_password, verify_password},
        repo::{NewUser, ProfileUpdate, Role, User},
        verification::{self, generate_code, Redeemed},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
        .route("/auth/profile", post(update_profile))
        .route("/auth/verify-email", get(verify_email))
        .route("/auth/verify-code", post(verify_code))
        .route("/auth/resend-code", post(resend_code))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

const DOB_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

fn parse_dob(dob: Option<&str>) -> Result<Option<Date>, ApiError> {
    match dob {
        None => Ok(None),
        Some(s) => Date::parse(s, DOB_FORMAT)
            .map(Some)
            .map_err(|_| ApiError::validation("Invalid date of birth.")),
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.full_name.trim().is_empty() {
        return Err(ApiError::validation("Full name is required."));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::validation("Invalid email."));
    }
    // Self-registration is limited to non-elevated roles; admins are seeded.
    let role = match payload.role.as_str() {
        "student" => Role::Student,
        "tutor" => Role::Tutor,
        _ => return Err(ApiError::validation("Role must be student or tutor.")),
    };
    validate_password(&payload.password).map_err(|msg| {
        warn!("password policy rejected");
        ApiError::validation(msg)
    })?;
    if payload.password != payload.confirm_password {
        return Err(ApiError::validation("Passwords do not match."));
    }
    let dob = parse_dob(payload.dob.as_deref())?;

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered.".into()));
    }

    let password = payload.password.clone();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(anyhow::Error::new)??;

    let code = generate_code();
    let user = User::create(
        &state.db,
        &NewUser {
            email: &payload.email,
            password_hash: &hash,
            full_name: payload.full_name.trim(),
            role,
            phone: payload.phone.as_deref(),
            gender: payload.gender.as_deref(),
            dob,
            school: payload.school.as_deref(),
            class_level: payload.class_level.as_deref(),
            verified: false,
            verification_code: Some(&code),
            code_sent_at: Some(OffsetDateTime::now_utc()),
        },
    )
    .await?;

    let email_sent = send_verification_email(&state, &user, &code).await;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful. Please check your email for the verification code."
                .into(),
            email_sent,
        }),
    ))
}

/// Deliver the code (and a signed verification link) to the user. Delivery
/// failure is reported through the return value, never as a request error.
async fn send_verification_email(state: &AppState, user: &User, code: &str) -> bool {
    let keys = JwtKeys::from_ref(state);
    let link = match keys.sign_verify(user.id, &user.email, user.role) {
        Ok(token) => format!(
            "{}/api/auth/verify-email?token={token}",
            state.config.public_url
        ),
        Err(e) => {
            error!(error = %e, "sign verification token failed");
            return false;
        }
    };

    let subject = "Verify Your Aurikrex Academy Account";
    let text = format!(
        "Your verification code is: {code}\n\n\
         Enter this code on the verification page to activate your account,\n\
         or open this link: {link}\n\n\
         This code expires in 10 minutes."
    );
    let html = format!(
        "<h2>Verify Your Email</h2>\
         <p>Your verification code is: <strong>{code}</strong></p>\
         <p>Enter this code to activate your account, or \
         <a href=\"{link}\">verify directly</a>.</p>\
         <p>This code expires in 10 minutes.</p>"
    );

    match state.mailer.send(&user.email, subject, &text, &html).await {
        Ok(()) => {
            info!(email = %user.email, "verification email sent");
            true
        }
        Err(e) => {
            error!(error = %e, email = %user.email, "failed to send verification email");
            false
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Email and password required."));
    }

    // Same message for unknown email and wrong password.
    let Some(user) = User::find_by_email(&state.db, &payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(ApiError::unauthorized("Invalid credentials."));
    };

    let hash = user.password_hash.clone();
    let password = payload.password.clone();
    let ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(anyhow::Error::new)??;
    if !ok {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::unauthorized("Invalid credentials."));
    }

    if !user.verified {
        warn!(email = %payload.email, user_id = %user.id, "login before verification");
        return Err(ApiError::unauthorized("Please verify your email first."));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign_access(user.id, &user.email, user.role)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let user = User::find_by_id(&state.db, identity.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(MeResponse {
        user: PublicUser::from(&user),
    }))
}

/// Stateless logout: the client discards its token.
pub async fn logout(AuthUser(_identity): AuthUser) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logged out successfully. Client should clear token.".into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let dob = parse_dob(payload.dob.as_deref())?;
    let update = ProfileUpdate {
        full_name: payload.full_name,
        gender: payload.gender,
        dob,
        phone: payload.phone,
        address: payload.address,
        guardian_name: payload.guardian_name,
        guardian_phone: payload.guardian_phone,
        school: payload.school,
        class_level: payload.class_level,
        subjects: payload.subjects,
        bio: payload.bio,
        profile_picture: payload.profile_picture,
    };

    let user = User::update_profile(&state.db, identity.id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(ProfileResponse {
        message: "Profile updated successfully.".into(),
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state, query))]
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = query
        .token
        .ok_or_else(|| ApiError::validation("Token required"))?;
    let keys = JwtKeys::from_ref(&state);
    let message = match verification::redeem_by_token(&state.db, &keys, &token).await? {
        Redeemed::Verified => "Email verified successfully.",
        Redeemed::AlreadyVerified => "Account already verified.",
    };
    Ok(Json(MessageResponse {
        message: message.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn verify_code(
    State(state): State<AppState>,
    Json(payload): Json<VerifyCodeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = payload.email.trim();
    if email.is_empty() || payload.code.is_empty() {
        return Err(ApiError::validation("Email and code required."));
    }
    let message = match verification::redeem_by_code(&state.db, email, &payload.code).await? {
        Redeemed::Verified => "Email verified successfully.",
        Redeemed::AlreadyVerified => "Account already verified.",
    };
    Ok(Json(MessageResponse {
        message: message.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn resend_code(
    State(state): State<AppState>,
    Json(payload): Json<ResendCodeRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::validation("Email required."));
    }
    let (user, code) = verification::resend(&state.db, &email).await?;
    let email_sent = send_verification_email(&state, &user, &code).await;

    info!(user_id = %user.id, "verification code resent");
    Ok(Json(RegisterResponse {
        message: "Verification code resent. Please check your email.".into(),
        email_sent,
    }))
}
