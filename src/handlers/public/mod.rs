// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Registration, login and every read-only listing/detail endpoint.
//
// Security Level: None
// Middleware: None

pub mod articles;
pub mod nutritionists;
pub mod recipes;
pub mod users;
