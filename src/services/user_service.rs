use sqlx::PgPool;
use tracing::info;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    ArticleCard, LoginRecord, MemberUpdate, NewAccount, NutritionistUpdate, PictureUpdate, Role,
    UserDetails, UserRecipeCard,
};
use crate::database::pagination::{Page, PageRequest};
use crate::database::query_builder::{fetch_page, PagedQuery, SqlValue, WhereClause};
use crate::services::article_service::{ARTICLE_CARD_COUNT, ARTICLE_CARD_SELECT};

pub const EMAIL_TAKEN: &str = "Email já está registrado.";
pub const NOT_PROFILE_OWNER: &str = "Você não tem permissão para editar este perfil.";
const USER_NOT_FOUND: &str = "Usuário não encontrado.";

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, DatabaseError> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Create the account and, for nutritionists, its profile in one transaction
    pub async fn register(&self, account: NewAccount) -> Result<i64, DatabaseError> {
        let user = account.user();
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(account.role().as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DatabaseError::conflict_on_unique(e, EMAIL_TAKEN))?;

        if let NewAccount::Nutritionist(_, profile) = &account {
            sqlx::query(
                "INSERT INTO nutritionist_profiles (user_id, crn, education, focus) VALUES ($1, $2, $3, $4)",
            )
            .bind(id)
            .bind(&profile.crn)
            .bind(&profile.education)
            .bind(&profile.focus)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Registered {} account {}", account.role(), id);
        Ok(id)
    }

    pub async fn find_for_login(&self, email: &str) -> Result<Option<LoginRecord>, DatabaseError> {
        let record = sqlx::query_as::<_, LoginRecord>(
            "SELECT id, name, role, email, profile_picture, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    pub async fn fetch_by_id(&self, id: i64) -> Result<UserDetails, DatabaseError> {
        sqlx::query_as::<_, UserDetails>(
            r#"
            SELECT
                u.id, u.role, u.name, u.email, u.profile_picture, u.cover_picture,
                n.focus, n.about, n.city, n.state, n.linkedin, n.instagram,
                n.website, n.phone, n.crn, n.education
            FROM users u
            LEFT JOIN nutritionist_profiles n ON n.user_id = u.id
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(USER_NOT_FOUND.to_string()))
    }

    pub async fn published_recipes(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Page<UserRecipeCard>, DatabaseError> {
        let mut clause = WhereClause::new();
        clause.push("r.user_id = {}", SqlValue::Int(user_id));

        let query = PagedQuery {
            select: "SELECT r.id, r.image, r.name AS title, r.intro AS summary FROM recipes r",
            count: "SELECT COUNT(*) FROM recipes r",
            order_by: "r.created_at DESC, r.id DESC",
        };
        fetch_page(&self.pool, query, &clause, page).await
    }

    pub async fn published_articles(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Page<ArticleCard>, DatabaseError> {
        let mut clause = WhereClause::new();
        clause.push("a.nutritionist_id = {}", SqlValue::Int(user_id));

        let query = PagedQuery {
            select: ARTICLE_CARD_SELECT,
            count: ARTICLE_CARD_COUNT,
            order_by: "a.created_at DESC, a.id DESC",
        };
        fetch_page(&self.pool, query, &clause, page).await
    }

    /// Store new profile/cover images. Returns the deletion handles of the
    /// images that were replaced, for the caller to release.
    pub async fn update_pictures(
        &self,
        profile_id: i64,
        caller_id: i64,
        update: &PictureUpdate,
    ) -> Result<Vec<String>, DatabaseError> {
        ensure_profile_owner(profile_id, caller_id)?;

        let profile = update.profile.as_ref();
        let cover = update.cover.as_ref();

        let (old_profile_id, old_cover_id): (Option<String>, Option<String>) = sqlx::query_as(
            r#"
            WITH old AS (
                SELECT profile_picture_id, cover_picture_id FROM users WHERE id = $5 FOR UPDATE
            )
            UPDATE users u SET
                profile_picture = COALESCE($1, u.profile_picture),
                profile_picture_id = COALESCE($2, u.profile_picture_id),
                cover_picture = COALESCE($3, u.cover_picture),
                cover_picture_id = COALESCE($4, u.cover_picture_id)
            FROM old
            WHERE u.id = $5
            RETURNING old.profile_picture_id, old.cover_picture_id
            "#,
        )
        .bind(profile.map(|img| img.url.as_str()))
        .bind(profile.map(|img| img.public_id.as_str()))
        .bind(cover.map(|img| img.url.as_str()))
        .bind(cover.map(|img| img.public_id.as_str()))
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(USER_NOT_FOUND.to_string()))?;

        let mut replaced = Vec::new();
        if profile.is_some() {
            replaced.extend(old_profile_id);
        }
        if cover.is_some() {
            replaced.extend(old_cover_id);
        }
        Ok(replaced)
    }

    pub async fn update_member(
        &self,
        profile_id: i64,
        caller_id: i64,
        update: &MemberUpdate,
    ) -> Result<(), DatabaseError> {
        ensure_profile_owner(profile_id, caller_id)?;

        let result = sqlx::query("UPDATE users SET name = $1, email = $2 WHERE id = $3")
            .bind(&update.name)
            .bind(&update.email)
            .bind(profile_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::conflict_on_unique(e, EMAIL_TAKEN))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(USER_NOT_FOUND.to_string()));
        }
        Ok(())
    }

    /// Update account and profile columns together
    pub async fn update_nutritionist(
        &self,
        profile_id: i64,
        caller_id: i64,
        update: &NutritionistUpdate,
    ) -> Result<(), DatabaseError> {
        ensure_profile_owner(profile_id, caller_id)?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE users SET name = $1, email = $2 WHERE id = $3 AND role = $4")
            .bind(&update.name)
            .bind(&update.email)
            .bind(profile_id)
            .bind(Role::Nutritionist.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::conflict_on_unique(e, EMAIL_TAKEN))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(USER_NOT_FOUND.to_string()));
        }

        sqlx::query(
            r#"
            UPDATE nutritionist_profiles SET
                crn = $1, education = $2, focus = $3, about = $4, phone = $5,
                website = $6, instagram = $7, linkedin = $8, state = $9, city = $10
            WHERE user_id = $11
            "#,
        )
        .bind(&update.crn)
        .bind(&update.education)
        .bind(&update.focus)
        .bind(&update.about)
        .bind(&update.phone)
        .bind(&update.website)
        .bind(&update.instagram)
        .bind(&update.linkedin)
        .bind(&update.state)
        .bind(&update.city)
        .bind(profile_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// A profile may only be edited by its own user
pub fn ensure_profile_owner(profile_id: i64, caller_id: i64) -> Result<(), DatabaseError> {
    if profile_id != caller_id {
        return Err(DatabaseError::PermissionDenied(NOT_PROFILE_OWNER.to_string()));
    }
    Ok(())
}
