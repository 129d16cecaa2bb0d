use utoipa::OpenApi;

/// Aggregated OpenAPI document for Intro Quiz Back.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::round_stream,
        crate::routes::round::start_match,
        crate::routes::round::get_round,
        crate::routes::round::start_round,
        crate::routes::round::buzz,
        crate::routes::round::answer,
        crate::routes::round::hint,
        crate::routes::round::advance,
        crate::routes::round::quit,
        crate::routes::round::press_key,
        crate::routes::preferences::get_preferences,
        crate::routes::preferences::update_preferences,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::round::RoundSnapshot,
            crate::dto::round::RevealedAnswer,
            crate::dto::round::EventResponse,
            crate::dto::round::BuzzRequest,
            crate::dto::round::AnswerRequest,
            crate::dto::round::KeyRequest,
            crate::dto::phase::VisibleRoundPhase,
            crate::dto::preferences::PreferencesPayload,
            crate::dto::sse::Handshake,
            crate::dto::sse::AudioCueEvent,
            crate::dto::sse::AudioExcerptEvent,
            crate::dto::sse::AudioStopEvent,
            crate::dto::sse::NavigateEvent,
            crate::state::effects::CueKind,
            crate::state::effects::MatchExit,
            crate::state::round::Choice,
            crate::state::score::Scores,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "round", description = "Match lifecycle and round inputs"),
        (name = "preferences", description = "Volume and sound effect settings"),
    )
)]
pub struct ApiDoc;
