// services/mod.rs - Entity data access
//
// One service per entity, each holding a clone of the shared pool. Services
// return DatabaseError; handlers convert to ApiError.

pub mod article_service;
pub mod nutritionist_service;
pub mod recipe_service;
pub mod user_service;

pub use article_service::ArticleService;
pub use nutritionist_service::NutritionistService;
pub use recipe_service::RecipeService;
pub use user_service::UserService;
