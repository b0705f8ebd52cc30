use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::manager::DatabaseError;
use crate::database::models::Role;
use crate::database::query_builder::{SqlValue, WhereClause};
use crate::storage::StoredImage;

/// Meal categories; a recipe may carry any combination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Breakfast,
    SnackDessert,
    LunchDinner,
}

impl Category {
    /// Vocabulary of the `filters` query parameter
    pub fn from_filter(value: &str) -> Option<Self> {
        match value {
            "cafe" => Some(Category::Breakfast),
            "lanchesESobremesas" => Some(Category::SnackDessert),
            "almocoEJantar" => Some(Category::LunchDinner),
            _ => None,
        }
    }

    /// Vocabulary of the create form; the filter spellings are accepted too
    pub fn from_form(value: &str) -> Option<Self> {
        match value {
            "lanche_sobremesa" => Some(Category::SnackDessert),
            "almoco_jantar" => Some(Category::LunchDinner),
            other => Self::from_filter(other),
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Category::Breakfast => "rc.breakfast",
            Category::SnackDessert => "rc.snack_dessert",
            Category::LunchDinner => "rc.lunch_dinner",
        }
    }
}

/// `?filters=` payload; axes are AND-combined, values within an axis OR-combined
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeFilter {
    #[serde(default)]
    pub categoria: Vec<String>,
    #[serde(default)]
    pub alimentacao: Vec<String>,
    #[serde(default, rename = "publicadoPor")]
    pub publicado_por: Vec<String>,
}

impl RecipeFilter {
    /// Parse the raw JSON; an absent parameter means no filtering
    pub fn parse(raw: Option<&str>) -> Result<Self, DatabaseError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(Self::default()),
            Some(json) => serde_json::from_str(json)
                .map_err(|e| DatabaseError::Invalid(format!("Filtros inválidos: {}", e))),
        }
    }

    /// Validate every value against its vocabulary and build the predicate
    pub fn to_where_clause(&self) -> Result<WhereClause, DatabaseError> {
        let mut clause = WhereClause::new();

        let mut columns = Vec::with_capacity(self.categoria.len());
        for value in &self.categoria {
            let category = Category::from_filter(value)
                .ok_or_else(|| DatabaseError::Invalid(format!("Categoria inválida: {}", value)))?;
            let column = category.column();
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        clause.push_any(&columns);

        if !self.alimentacao.is_empty() {
            clause.push("r.diet_type = ANY({})", SqlValue::TextArray(self.alimentacao.clone()));
        }

        if !self.publicado_por.is_empty() {
            let roles = self
                .publicado_por
                .iter()
                .map(|value| match value.as_str() {
                    "membros" => Ok(Role::Member.as_str().to_string()),
                    "nutricionistas" => Ok(Role::Nutritionist.as_str().to_string()),
                    other => Err(DatabaseError::Invalid(format!("Publicador inválido: {}", other))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            clause.push("u.role = ANY({})", SqlValue::TextArray(roles));
        }

        Ok(clause)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeSort {
    Recent,
    Oldest,
    BestRated,
}

impl RecipeSort {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "recent" => Some(RecipeSort::Recent),
            "oldest" => Some(RecipeSort::Oldest),
            "bestRated" => Some(RecipeSort::BestRated),
            _ => None,
        }
    }

    pub fn order_by(&self) -> &'static str {
        match self {
            RecipeSort::Recent => "r.created_at DESC, r.id DESC",
            RecipeSort::Oldest => "r.created_at ASC, r.id ASC",
            RecipeSort::BestRated => {
                "COALESCE((SELECT AVG(ra.score) FROM ratings ra WHERE ra.recipe_id = r.id), 0) DESC, r.id DESC"
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecipeCard {
    #[serde(rename = "id_receitas")]
    pub id: i64,
    #[serde(rename = "imagem")]
    pub image: Option<String>,
    #[serde(rename = "nome_da_receita")]
    pub name: String,
    #[serde(rename = "introducao")]
    pub intro: String,
    #[serde(rename = "alimentacao")]
    pub diet_type: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecentRecipeCard {
    pub id: i64,
    pub title: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub name: String,
    pub intro: String,
    pub prep_time: String,
    pub yield_amount: String,
    pub diet_type: String,
    pub categories: Vec<Category>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub user_id: i64,
    pub image: Option<StoredImage>,
}

impl NewRecipe {
    pub fn has_category(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }
}

/// Recipe columns joined with the author
#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: i64,
    pub name: String,
    pub intro: String,
    pub prep_time: String,
    pub yield_amount: String,
    pub diet_type: String,
    pub image: Option<String>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub author_name: String,
    pub author_role: String,
    pub author_picture: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CategoryFlags {
    pub cafe: bool,
    pub lanche_sobremesa: bool,
    pub almoco_jantar: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingSummary {
    #[serde(rename = "somaAvaliacoes")]
    pub sum: i64,
    #[serde(rename = "totalAvaliacoes")]
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    pub id_receitas: i64,
    pub nome_da_receita: String,
    pub introducao: String,
    pub tempo_de_preparo: String,
    pub rendimento: String,
    pub alimentacao: String,
    pub imagem: Option<String>,
    pub id_usuario: i64,
    pub data_criacao: DateTime<Utc>,
    pub nome_usuario: String,
    pub tipo_usuario: String,
    pub foto_perfil: Option<String>,
    pub categoria: Vec<CategoryFlags>,
    #[serde(rename = "modoDePreparo")]
    pub modo_de_preparo: Vec<String>,
    pub ingredientes: Vec<String>,
    #[serde(rename = "totalReceitasUsuario")]
    pub total_receitas_usuario: i64,
    #[serde(rename = "quantidadeDeArtigosEscritos")]
    pub quantidade_de_artigos_escritos: i64,
    pub avaliacoes: RatingSummary,
}

impl RecipeDetail {
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        row: RecipeRow,
        categoria: Vec<CategoryFlags>,
        steps: Vec<String>,
        ingredients: Vec<String>,
        author_recipes: i64,
        author_articles: i64,
        ratings: RatingSummary,
    ) -> Self {
        Self {
            id_receitas: row.id,
            nome_da_receita: row.name,
            introducao: row.intro,
            tempo_de_preparo: row.prep_time,
            rendimento: row.yield_amount,
            alimentacao: row.diet_type,
            imagem: row.image,
            id_usuario: row.user_id,
            data_criacao: row.created_at,
            nome_usuario: row.author_name,
            tipo_usuario: row.author_role,
            foto_perfil: row.author_picture,
            categoria,
            modo_de_preparo: steps,
            ingredientes: ingredients,
            total_receitas_usuario: author_recipes,
            quantidade_de_artigos_escritos: author_articles,
            avaliacoes: ratings,
        }
    }
}

/// Result of a rating attempt; a repeat rating is reported, not failed
#[derive(Debug, Clone, Serialize)]
pub struct RatingOutcome {
    pub success: bool,
    pub message: String,
}

impl RatingOutcome {
    pub fn added() -> Self {
        Self { success: true, message: "Rating adicionado com sucesso".to_string() }
    }

    pub fn already_rated() -> Self {
        Self { success: false, message: "Você já avaliou esta receita.".to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_vocabularies() {
        assert_eq!(Category::from_filter("lanchesESobremesas"), Some(Category::SnackDessert));
        assert_eq!(Category::from_filter("lanche_sobremesa"), None);
        assert_eq!(Category::from_form("lanche_sobremesa"), Some(Category::SnackDessert));
        assert_eq!(Category::from_form("almocoEJantar"), Some(Category::LunchDinner));
        assert_eq!(Category::from_form("cafe"), Some(Category::Breakfast));
    }

    #[test]
    fn absent_filter_is_unfiltered() {
        let filter = RecipeFilter::parse(None).unwrap();
        assert!(filter.to_where_clause().unwrap().is_empty());

        let filter = RecipeFilter::parse(Some("{}")).unwrap();
        assert!(filter.to_where_clause().unwrap().is_empty());
    }

    #[test]
    fn filter_builds_and_of_ors() {
        let filter = RecipeFilter::parse(Some(
            r#"{"categoria":["cafe","almocoEJantar"],"alimentacao":["vegana"],"publicadoPor":["membros"]}"#,
        ))
        .unwrap();
        let clause = filter.to_where_clause().unwrap();
        assert_eq!(
            clause.to_sql(),
            " WHERE (rc.breakfast OR rc.lunch_dinner) AND r.diet_type = ANY($1) AND u.role = ANY($2)"
        );
        assert_eq!(clause.params()[1], SqlValue::TextArray(vec!["membro".to_string()]));
    }

    #[test]
    fn unknown_filter_values_are_rejected() {
        let filter = RecipeFilter::parse(Some(r#"{"categoria":["jantarzinho"]}"#)).unwrap();
        assert!(matches!(filter.to_where_clause(), Err(DatabaseError::Invalid(_))));

        let filter = RecipeFilter::parse(Some(r#"{"publicadoPor":["robos"]}"#)).unwrap();
        assert!(matches!(filter.to_where_clause(), Err(DatabaseError::Invalid(_))));

        assert!(matches!(RecipeFilter::parse(Some("not json")), Err(DatabaseError::Invalid(_))));
    }

    #[test]
    fn sort_orders_end_in_unique_tiebreaker() {
        for sort in [RecipeSort::Recent, RecipeSort::Oldest, RecipeSort::BestRated] {
            assert!(sort.order_by().ends_with("r.id DESC") || sort.order_by().ends_with("r.id ASC"));
        }
        assert_eq!(RecipeSort::parse("bestRated"), Some(RecipeSort::BestRated));
        assert_eq!(RecipeSort::parse("best"), None);
    }
}
