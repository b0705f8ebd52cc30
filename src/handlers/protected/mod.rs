// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every handler here receives the caller as an `Extension<AuthUser>` injected
// by jwt_auth_middleware. Article create/delete and the nutritionist profile
// update are additionally wrapped in require_nutritionist.
//
// Security Level: JWT Authentication Required

pub mod articles;
pub mod recipes;
pub mod users;
