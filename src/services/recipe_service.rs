use sqlx::PgPool;
use tracing::info;

use crate::database::manager::DatabaseError;
use crate::database::models::recipe::{CategoryFlags, RatingSummary, RecipeRow};
use crate::database::models::{
    Category, NewRecipe, RatingOutcome, RecentRecipeCard, RecipeCard, RecipeDetail, RecipeFilter,
    RecipeSort, Role,
};
use crate::database::pagination::{Page, PageRequest};
use crate::database::query_builder::{contains_pattern, fetch_page, PagedQuery, SqlValue, WhereClause};

const CARD_SELECT: &str = "SELECT r.id, r.image, r.name, r.intro, r.diet_type FROM recipes r \
     JOIN users u ON u.id = r.user_id \
     LEFT JOIN recipe_categories rc ON rc.recipe_id = r.id";

const CARD_COUNT: &str = "SELECT COUNT(*) FROM recipes r \
     JOIN users u ON u.id = r.user_id \
     LEFT JOIN recipe_categories rc ON rc.recipe_id = r.id";

const RECIPE_NOT_FOUND: &str = "Receita não encontrada.";
const NOT_RECIPE_OWNER: &str = "Você não tem permissão para excluir esta receita.";

pub const MIN_SCORE: i16 = 1;
pub const MAX_SCORE: i16 = 5;

pub struct RecipeService {
    pool: PgPool,
}

impl RecipeService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the recipe with its categories, ingredients and steps atomically
    pub async fn create(&self, recipe: &NewRecipe) -> Result<i64, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO recipes (name, intro, prep_time, yield_amount, diet_type, image, image_id, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&recipe.name)
        .bind(&recipe.intro)
        .bind(&recipe.prep_time)
        .bind(&recipe.yield_amount)
        .bind(&recipe.diet_type)
        .bind(recipe.image.as_ref().map(|img| img.url.as_str()))
        .bind(recipe.image.as_ref().map(|img| img.public_id.as_str()))
        .bind(recipe.user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DatabaseError::not_found_on_foreign_key(e, "Usuário não encontrado."))?;

        sqlx::query(
            "INSERT INTO recipe_categories (recipe_id, breakfast, snack_dessert, lunch_dinner) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(recipe.has_category(Category::Breakfast))
        .bind(recipe.has_category(Category::SnackDessert))
        .bind(recipe.has_category(Category::LunchDinner))
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO ingredients (recipe_id, position, value)
            SELECT $1, t.ord::INT, t.value FROM UNNEST($2::TEXT[]) WITH ORDINALITY AS t(value, ord)
            "#,
        )
        .bind(id)
        .bind(&recipe.ingredients)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO preparation_steps (recipe_id, position, value)
            SELECT $1, t.ord::INT, t.value FROM UNNEST($2::TEXT[]) WITH ORDINALITY AS t(value, ord)
            "#,
        )
        .bind(id)
        .bind(&recipe.steps)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(
            "Created recipe {} ({} ingredients, {} steps) for user {}",
            id,
            recipe.ingredients.len(),
            recipe.steps.len(),
            recipe.user_id
        );
        Ok(id)
    }

    pub async fn fetch_list(&self, page: PageRequest) -> Result<Page<RecipeCard>, DatabaseError> {
        self.cards(&WhereClause::new(), RecipeSort::Recent, page).await
    }

    pub async fn fetch_by_id(&self, id: i64) -> Result<RecipeDetail, DatabaseError> {
        let row = sqlx::query_as::<_, RecipeRow>(
            r#"
            SELECT
                r.id, r.name, r.intro, r.prep_time, r.yield_amount, r.diet_type, r.image,
                r.user_id, r.created_at, u.name AS author_name, u.role AS author_role,
                u.profile_picture AS author_picture
            FROM recipes r
            JOIN users u ON u.id = r.user_id
            WHERE r.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(RECIPE_NOT_FOUND.to_string()))?;

        let categories = sqlx::query_as::<_, CategoryFlags>(
            "SELECT breakfast AS cafe, snack_dessert AS lanche_sobremesa, lunch_dinner AS almoco_jantar \
             FROM recipe_categories WHERE recipe_id = $1",
        )
        .bind(id)
        .fetch_all(&self.pool);

        let steps = sqlx::query_as::<_, (String,)>(
            "SELECT value FROM preparation_steps WHERE recipe_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool);

        let ingredients = sqlx::query_as::<_, (String,)>(
            "SELECT value FROM ingredients WHERE recipe_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool);

        let author_counts = sqlx::query_as::<_, (i64, i64)>(
            "SELECT (SELECT COUNT(*) FROM recipes WHERE user_id = $1), \
                    (SELECT COUNT(*) FROM articles WHERE nutritionist_id = $1)",
        )
        .bind(row.user_id)
        .fetch_one(&self.pool);

        let ratings = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COALESCE(SUM(score), 0)::BIGINT, COUNT(*) FROM ratings WHERE recipe_id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool);

        let (categories, steps, ingredients, (author_recipes, author_articles), (sum, count)) =
            tokio::try_join!(categories, steps, ingredients, author_counts, ratings)?;

        Ok(RecipeDetail::assemble(
            row,
            categories,
            steps.into_iter().map(|(s,)| s).collect(),
            ingredients.into_iter().map(|(s,)| s).collect(),
            author_recipes,
            author_articles,
            RatingSummary { sum, count },
        ))
    }

    /// Delete a recipe owned by `user_id`; dependents go with it. Returns the
    /// image's deletion handle, if any, for the caller to release.
    pub async fn remove(&self, id: i64, user_id: i64) -> Result<Option<String>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let (owner, image_id): (i64, Option<String>) =
            sqlx::query_as("SELECT user_id, image_id FROM recipes WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DatabaseError::NotFound(RECIPE_NOT_FOUND.to_string()))?;

        if owner != user_id {
            return Err(DatabaseError::PermissionDenied(NOT_RECIPE_OWNER.to_string()));
        }

        sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Deleted recipe {}", id);
        Ok(image_id)
    }

    /// Record a 1..=5 score; a second rating by the same user is reported, not stored
    pub async fn add_rating(
        &self,
        recipe_id: i64,
        user_id: i64,
        score: i64,
    ) -> Result<RatingOutcome, DatabaseError> {
        let score = validate_score(score)?;

        let result = sqlx::query(
            r#"
            INSERT INTO ratings (recipe_id, user_id, score) VALUES ($1, $2, $3)
            ON CONFLICT (recipe_id, user_id) DO NOTHING
            "#,
        )
        .bind(recipe_id)
        .bind(user_id)
        .bind(score)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::not_found_on_foreign_key(e, RECIPE_NOT_FOUND))?;

        if result.rows_affected() == 0 {
            return Ok(RatingOutcome::already_rated());
        }
        Ok(RatingOutcome::added())
    }

    /// Match on name, introduction or any ingredient
    pub async fn search(&self, term: &str, page: PageRequest) -> Result<Page<RecipeCard>, DatabaseError> {
        let mut clause = WhereClause::new();
        clause.push(
            "(r.name ILIKE {} OR r.intro ILIKE {} OR EXISTS \
             (SELECT 1 FROM ingredients i WHERE i.recipe_id = r.id AND i.value ILIKE {}))",
            SqlValue::Text(contains_pattern(term)),
        );
        self.cards(&clause, RecipeSort::Recent, page).await
    }

    pub async fn filter(&self, filter: &RecipeFilter, page: PageRequest) -> Result<Page<RecipeCard>, DatabaseError> {
        let clause = filter.to_where_clause()?;
        self.cards(&clause, RecipeSort::Recent, page).await
    }

    pub async fn sort(&self, order: RecipeSort, page: PageRequest) -> Result<Page<RecipeCard>, DatabaseError> {
        self.cards(&WhereClause::new(), order, page).await
    }

    pub async fn recent_by_nutritionists(
        &self,
        page: PageRequest,
    ) -> Result<Page<RecentRecipeCard>, DatabaseError> {
        let mut clause = WhereClause::new();
        clause.push("u.role = {}", SqlValue::Text(Role::Nutritionist.as_str().to_string()));

        let query = PagedQuery {
            select: "SELECT r.id, r.name AS title, r.image FROM recipes r JOIN users u ON u.id = r.user_id",
            count: "SELECT COUNT(*) FROM recipes r JOIN users u ON u.id = r.user_id",
            order_by: RecipeSort::Recent.order_by(),
        };
        fetch_page(&self.pool, query, &clause, page).await
    }

    async fn cards(
        &self,
        clause: &WhereClause,
        order: RecipeSort,
        page: PageRequest,
    ) -> Result<Page<RecipeCard>, DatabaseError> {
        let query = PagedQuery { select: CARD_SELECT, count: CARD_COUNT, order_by: order.order_by() };
        fetch_page(&self.pool, query, clause, page).await
    }
}

pub fn validate_score(score: i64) -> Result<i16, DatabaseError> {
    i16::try_from(score)
        .ok()
        .filter(|s| (MIN_SCORE..=MAX_SCORE).contains(s))
        .ok_or_else(|| DatabaseError::Invalid("O rating deve estar entre 1 e 5".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_outside_range_are_invalid() {
        assert_eq!(validate_score(1).unwrap(), 1);
        assert_eq!(validate_score(5).unwrap(), 5);
        assert!(matches!(validate_score(0), Err(DatabaseError::Invalid(_))));
        assert!(matches!(validate_score(6), Err(DatabaseError::Invalid(_))));
        assert!(matches!(validate_score(i64::MAX), Err(DatabaseError::Invalid(_))));
    }

    #[test]
    fn search_reuses_one_bound_term() {
        let mut clause = WhereClause::new();
        clause.push(
            "(r.name ILIKE {} OR r.intro ILIKE {} OR EXISTS \
             (SELECT 1 FROM ingredients i WHERE i.recipe_id = r.id AND i.value ILIKE {}))",
            SqlValue::Text(contains_pattern("ovo")),
        );
        let query = PagedQuery { select: CARD_SELECT, count: CARD_COUNT, order_by: RecipeSort::Recent.order_by() };
        let sql = query.select_sql(&clause);
        assert_eq!(sql.matches("$1").count(), 3);
        assert!(sql.ends_with("LIMIT $2 OFFSET $3"));
    }
}
