use once_cell::sync::Lazy;
use sqlx::PgPool;
use tracing::info;

use crate::database::manager::DatabaseError;
use crate::database::models::{ArticleCard, ArticleDetails, ArticleSort, NewArticle};
use crate::database::pagination::{Page, PageRequest};
use crate::database::query_builder::{contains_pattern, fetch_page, PagedQuery, SqlValue, WhereClause};

/// Card columns of an article joined with its author and profile
pub(crate) const ARTICLE_CARD_SELECT: &str = "SELECT a.id, a.created_at AS publication_date, \
     a.nutritionist_id, a.title, u.name AS nutritionist_name, \
     u.profile_picture AS nutritionist_profile_picture, n.focus AS nutritionist_focus \
     FROM articles a \
     JOIN users u ON u.id = a.nutritionist_id \
     JOIN nutritionist_profiles n ON n.user_id = a.nutritionist_id";

pub(crate) const ARTICLE_CARD_COUNT: &str = "SELECT COUNT(*) FROM articles a \
     JOIN users u ON u.id = a.nutritionist_id \
     JOIN nutritionist_profiles n ON n.user_id = a.nutritionist_id";

const ARTICLE_NOT_FOUND: &str = "Artigo não encontrado.";
const NOT_ARTICLE_OWNER: &str = "Você não tem permissão para excluir este artigo.";

/// HTML policy for article bodies
static SANITIZER: Lazy<ammonia::Builder<'static>> = Lazy::new(|| {
    let mut builder = ammonia::Builder::default();
    builder.link_rel(Some("noopener noreferrer nofollow"));
    builder
});

pub fn sanitize_html(html: &str) -> String {
    SANITIZER.clean(html).to_string()
}

pub struct ArticleService {
    pool: PgPool,
}

impl ArticleService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, article: &NewArticle) -> Result<i64, DatabaseError> {
        let body = sanitize_html(&article.body);

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO articles (title, body, image, image_id, nutritionist_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&article.title)
        .bind(&body)
        .bind(&article.image.url)
        .bind(&article.image.public_id)
        .bind(article.nutritionist_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::not_found_on_foreign_key(e, "Nutricionista não encontrado."))?;

        info!("Created article {} for nutritionist {}", id, article.nutritionist_id);
        Ok(id)
    }

    pub async fn fetch_list(&self, page: PageRequest) -> Result<Page<ArticleCard>, DatabaseError> {
        self.list(&WhereClause::new(), ArticleSort::Recent, page).await
    }

    /// Full article; every call counts as one view
    pub async fn fetch_by_id(&self, id: i64) -> Result<ArticleDetails, DatabaseError> {
        sqlx::query_as::<_, ArticleDetails>(
            r#"
            WITH viewed AS (
                UPDATE articles SET view_count = view_count + 1 WHERE id = $1 RETURNING *
            )
            SELECT
                v.image, v.created_at AS publication_date, v.title, v.nutritionist_id,
                v.body AS text, v.view_count, u.name AS nutritionist_name,
                u.profile_picture AS nutritionist_profile_picture, n.focus AS nutritionist_focus
            FROM viewed v
            JOIN users u ON u.id = v.nutritionist_id
            JOIN nutritionist_profiles n ON n.user_id = v.nutritionist_id
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(ARTICLE_NOT_FOUND.to_string()))
    }

    /// Delete an article owned by `nutritionist_id`. Returns the image's
    /// deletion handle for the caller to release.
    pub async fn remove(&self, id: i64, nutritionist_id: i64) -> Result<String, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let (owner, image_id): (i64, String) =
            sqlx::query_as("SELECT nutritionist_id, image_id FROM articles WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DatabaseError::NotFound(ARTICLE_NOT_FOUND.to_string()))?;

        if owner != nutritionist_id {
            return Err(DatabaseError::PermissionDenied(NOT_ARTICLE_OWNER.to_string()));
        }

        sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Deleted article {}", id);
        Ok(image_id)
    }

    pub async fn search(&self, term: &str, page: PageRequest) -> Result<Page<ArticleCard>, DatabaseError> {
        let mut clause = WhereClause::new();
        clause.push("a.title ILIKE {}", SqlValue::Text(contains_pattern(term)));
        self.list(&clause, ArticleSort::Recent, page).await
    }

    pub async fn sort(&self, order: ArticleSort, page: PageRequest) -> Result<Page<ArticleCard>, DatabaseError> {
        self.list(&WhereClause::new(), order, page).await
    }

    async fn list(
        &self,
        clause: &WhereClause,
        order: ArticleSort,
        page: PageRequest,
    ) -> Result<Page<ArticleCard>, DatabaseError> {
        let query = PagedQuery {
            select: ARTICLE_CARD_SELECT,
            count: ARTICLE_CARD_COUNT,
            order_by: order.order_by(),
        };
        fetch_page(&self.pool, query, clause, page).await
    }
}
