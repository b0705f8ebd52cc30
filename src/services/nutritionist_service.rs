use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::{NutritionistCard, NutritionistSort, Role};
use crate::database::pagination::{Page, PageRequest};
use crate::database::query_builder::{contains_pattern, fetch_page, PagedQuery, SqlValue, WhereClause};

const CARD_QUERY: PagedQuery<'static> = PagedQuery {
    select: "SELECT u.id, u.cover_picture, u.profile_picture, u.name, n.focus, \
             (SELECT COUNT(*) FROM recipes r WHERE r.user_id = u.id) AS number_of_published_recipes, \
             (SELECT COUNT(*) FROM articles a WHERE a.nutritionist_id = u.id) AS number_of_articles_written \
             FROM users u JOIN nutritionist_profiles n ON n.user_id = u.id",
    count: "SELECT COUNT(*) FROM users u JOIN nutritionist_profiles n ON n.user_id = u.id",
    order_by: "u.name ASC, u.id ASC",
};

/// Read-only directory of nutritionists
pub struct NutritionistService {
    pool: PgPool,
}

impl NutritionistService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn fetch_list(&self, page: PageRequest) -> Result<Page<NutritionistCard>, DatabaseError> {
        fetch_page(&self.pool, CARD_QUERY, &nutritionists_only(), page).await
    }

    pub async fn search(&self, term: &str, page: PageRequest) -> Result<Page<NutritionistCard>, DatabaseError> {
        let mut clause = nutritionists_only();
        clause.push("u.name ILIKE {}", SqlValue::Text(contains_pattern(term)));
        fetch_page(&self.pool, CARD_QUERY, &clause, page).await
    }

    /// Narrow to one focus, ordered by name
    pub async fn sort(
        &self,
        criterion: NutritionistSort,
        page: PageRequest,
    ) -> Result<Page<NutritionistCard>, DatabaseError> {
        let mut clause = nutritionists_only();
        clause.push("n.focus = {}", SqlValue::Text(criterion.focus().to_string()));
        fetch_page(&self.pool, CARD_QUERY, &clause, page).await
    }
}

fn nutritionists_only() -> WhereClause {
    let mut clause = WhereClause::new();
    clause.push("u.role = {}", SqlValue::Text(Role::Nutritionist.as_str().to_string()));
    clause
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_clause_narrows_by_focus() {
        let mut clause = nutritionists_only();
        clause.push("n.focus = {}", SqlValue::Text(NutritionistSort::Vegan.focus().to_string()));
        assert_eq!(
            CARD_QUERY.count_sql(&clause),
            "SELECT COUNT(*) FROM users u JOIN nutritionist_profiles n ON n.user_id = u.id WHERE u.role = $1 AND n.focus = $2"
        );
        assert!(CARD_QUERY.select_sql(&clause).ends_with("ORDER BY u.name ASC, u.id ASC LIMIT $3 OFFSET $4"));
    }
}
