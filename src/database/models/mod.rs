pub mod article;
pub mod nutritionist;
pub mod recipe;
pub mod user;

pub use article::{ArticleCard, ArticleDetails, ArticleSort, NewArticle};
pub use nutritionist::{NutritionistCard, NutritionistSort};
pub use recipe::{
    Category, NewRecipe, RatingOutcome, RecentRecipeCard, RecipeCard, RecipeDetail, RecipeFilter,
    RecipeSort,
};
pub use user::{
    LoginRecord, MemberUpdate, NewAccount, NewUser, NutritionistProfileInput, NutritionistUpdate,
    PictureUpdate, Role, UserDetails, UserRecipeCard,
};

use crate::database::manager::DatabaseError;

/// Resolve a required `?order=` value against a fixed vocabulary
pub(crate) fn parse_order<T>(
    order: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, DatabaseError> {
    let order = order
        .filter(|o| !o.is_empty())
        .ok_or_else(|| DatabaseError::Invalid("O parâmetro 'order' é obrigatório.".to_string()))?;
    parse(order).ok_or_else(|| DatabaseError::Invalid("Critério de ordenação inválido.".to_string()))
}
