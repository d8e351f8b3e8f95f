use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::{
    config::Config,
    error::Result,
    models::{Card, CardType, Deck, Property, RefreshToken, User},
    services::pagination::{PaginationQuery, USER_SORT_COLUMNS},
};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        // migrations live at the crate root: ./migrations
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ==================== USER QUERIES ====================

/// Insert payload for users; password is already hashed by the caller.
#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub address: String,
    pub chain: String,
    pub password_hash: String,
}

/// Partial update; None leaves the column untouched.
#[derive(Debug, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub chain: Option<String>,
    pub games_played: Option<i32>,
    pub game_won: Option<i32>,
    pub game_lost: Option<i32>,
    pub total_staked: Option<rust_decimal::Decimal>,
    pub total_earned: Option<rust_decimal::Decimal>,
    pub total_withdrawn: Option<rust_decimal::Decimal>,
}

impl Database {
    pub async fn create_user(&self, new_user: &NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, address, chain, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&new_user.username)
        .bind(&new_user.address)
        .bind(&new_user.chain)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_user_by_address(&self, address: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE address = $1")
            .bind(address)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Paged listing with optional ILIKE search over username and address.
    /// The ORDER BY column comes from the whitelist, never from raw input.
    pub async fn list_users(&self, query: &PaginationQuery) -> Result<(Vec<User>, i64)> {
        let order_clause = query.order_clause(USER_SORT_COLUMNS, "id");
        let search = query.search_pattern();

        let sql = format!(
            "SELECT * FROM users
             WHERE ($1::text IS NULL OR username ILIKE $1 OR address ILIKE $1)
             {} LIMIT $2 OFFSET $3",
            order_clause
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(&search)
            .bind(query.limit() as i64)
            .bind(query.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users
             WHERE ($1::text IS NULL OR username ILIKE $1 OR address ILIKE $1)",
        )
        .bind(&search)
        .fetch_one(&self.pool)
        .await?;

        Ok((users, total))
    }

    pub async fn update_user(&self, id: i32, update: &UserUpdate) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username        = COALESCE($2, username),
                chain           = COALESCE($3, chain),
                games_played    = COALESCE($4, games_played),
                game_won        = COALESCE($5, game_won),
                game_lost       = COALESCE($6, game_lost),
                total_staked    = COALESCE($7, total_staked),
                total_earned    = COALESCE($8, total_earned),
                total_withdrawn = COALESCE($9, total_withdrawn),
                updated_at      = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.username)
        .bind(&update.chain)
        .bind(update.games_played)
        .bind(update.game_won)
        .bind(update.game_lost)
        .bind(update.total_staked)
        .bind(update.total_earned)
        .bind(update.total_withdrawn)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ==================== PROPERTY QUERIES ====================
impl Database {
    pub async fn create_property(&self, property: &Property) -> Result<Property> {
        let created = sqlx::query_as::<_, Property>(
            r#"
            INSERT INTO properties
                (id, type, name, group_id, position, grid_row, grid_col, price,
                 rent_site_only, rent_one_house, rent_two_houses, rent_three_houses,
                 rent_four_houses, rent_hotel, cost_of_house, is_mortgaged, color, icon)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18)
            RETURNING *
            "#,
        )
        .bind(property.id)
        .bind(&property.property_type)
        .bind(&property.name)
        .bind(property.group_id)
        .bind(&property.position)
        .bind(property.grid_row)
        .bind(property.grid_col)
        .bind(property.price)
        .bind(property.rent_site_only)
        .bind(property.rent_one_house)
        .bind(property.rent_two_houses)
        .bind(property.rent_three_houses)
        .bind(property.rent_four_houses)
        .bind(property.rent_hotel)
        .bind(property.cost_of_house)
        .bind(property.is_mortgaged)
        .bind(&property.color)
        .bind(&property.icon)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    pub async fn get_property(&self, id: i32) -> Result<Option<Property>> {
        let property = sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(property)
    }

    pub async fn list_properties(
        &self,
        property_type: Option<&str>,
        group_id: Option<i32>,
    ) -> Result<Vec<Property>> {
        let properties = sqlx::query_as::<_, Property>(
            "SELECT * FROM properties
             WHERE ($1::text IS NULL OR type = $1)
               AND ($2::int IS NULL OR group_id = $2)
             ORDER BY id ASC",
        )
        .bind(property_type)
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(properties)
    }

    pub async fn set_property_mortgaged(
        &self,
        id: i32,
        is_mortgaged: bool,
    ) -> Result<Option<Property>> {
        let property = sqlx::query_as::<_, Property>(
            "UPDATE properties SET is_mortgaged = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_mortgaged)
        .fetch_optional(&self.pool)
        .await?;
        Ok(property)
    }

    pub async fn update_rent_structure(
        &self,
        id: i32,
        update: &RentStructureUpdate,
    ) -> Result<Option<Property>> {
        let property = sqlx::query_as::<_, Property>(
            r#"
            UPDATE properties
            SET rent_site_only    = COALESCE($2, rent_site_only),
                rent_one_house    = COALESCE($3, rent_one_house),
                rent_two_houses   = COALESCE($4, rent_two_houses),
                rent_three_houses = COALESCE($5, rent_three_houses),
                rent_four_houses  = COALESCE($6, rent_four_houses),
                rent_hotel        = COALESCE($7, rent_hotel),
                cost_of_house     = COALESCE($8, cost_of_house)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.rent_site_only)
        .bind(update.rent_one_house)
        .bind(update.rent_two_houses)
        .bind(update.rent_three_houses)
        .bind(update.rent_four_houses)
        .bind(update.rent_hotel)
        .bind(update.cost_of_house)
        .fetch_optional(&self.pool)
        .await?;
        Ok(property)
    }
}

/// Partial rent-structure update; None leaves the tier untouched.
#[derive(Debug, Default)]
pub struct RentStructureUpdate {
    pub rent_site_only: Option<i32>,
    pub rent_one_house: Option<i32>,
    pub rent_two_houses: Option<i32>,
    pub rent_three_houses: Option<i32>,
    pub rent_four_houses: Option<i32>,
    pub rent_hotel: Option<i32>,
    pub cost_of_house: Option<i32>,
}

// ==================== CARD DECK QUERIES ====================

/// Insert payload shared by both decks.
#[derive(Debug)]
pub struct NewCard {
    pub instruction: String,
    pub card_type: CardType,
    pub amount: Option<i32>,
    pub position: Option<i32>,
    pub extra: Option<serde_json::Value>,
}

impl Database {
    pub async fn create_card(&self, deck: Deck, card: &NewCard) -> Result<Card> {
        let sql = format!(
            "INSERT INTO {} (instruction, card_type, amount, position, extra)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
            deck.table()
        );
        let created = sqlx::query_as::<_, Card>(&sql)
            .bind(&card.instruction)
            .bind(card.card_type)
            .bind(card.amount)
            .bind(card.position)
            .bind(&card.extra)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    pub async fn get_card(&self, deck: Deck, id: i32) -> Result<Option<Card>> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", deck.table());
        let card = sqlx::query_as::<_, Card>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(card)
    }

    pub async fn get_card_by_instruction(
        &self,
        deck: Deck,
        instruction: &str,
    ) -> Result<Option<Card>> {
        let sql = format!("SELECT * FROM {} WHERE instruction = $1", deck.table());
        let card = sqlx::query_as::<_, Card>(&sql)
            .bind(instruction)
            .fetch_optional(&self.pool)
            .await?;
        Ok(card)
    }

    /// Uniform random draw, done database-side.
    pub async fn draw_card(&self, deck: Deck) -> Result<Option<Card>> {
        let sql = format!("SELECT * FROM {} ORDER BY RANDOM() LIMIT 1", deck.table());
        let card = sqlx::query_as::<_, Card>(&sql)
            .fetch_optional(&self.pool)
            .await?;
        Ok(card)
    }

    pub async fn list_cards_paged(&self, deck: Deck, limit: i64, offset: i64) -> Result<Vec<Card>> {
        let sql = format!(
            "SELECT * FROM {} ORDER BY id ASC LIMIT $1 OFFSET $2",
            deck.table()
        );
        let cards = sqlx::query_as::<_, Card>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(cards)
    }

    /// Sorted/filtered listing. order_clause is built from a column
    /// whitelist upstream.
    pub async fn list_cards_sorted(
        &self,
        deck: Deck,
        order_clause: &str,
        card_type: Option<CardType>,
    ) -> Result<Vec<Card>> {
        let sql = format!(
            "SELECT * FROM {} WHERE ($1::card_type IS NULL OR card_type = $1) {}",
            deck.table(),
            order_clause
        );
        let cards = sqlx::query_as::<_, Card>(&sql)
            .bind(card_type)
            .fetch_all(&self.pool)
            .await?;
        Ok(cards)
    }
}

// ==================== REFRESH TOKEN QUERIES ====================
impl Database {
    pub async fn insert_refresh_token(
        &self,
        user_id: i32,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken> {
        let row = sqlx::query_as::<_, RefreshToken>(
            "INSERT INTO refresh_tokens (id, token, user_id, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Only unrevoked tokens are visible to rotation; a replayed token
    /// simply does not match.
    pub async fn get_active_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>> {
        let row = sqlx::query_as::<_, RefreshToken>(
            "SELECT * FROM refresh_tokens WHERE token = $1 AND is_revoked = false",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn revoke_refresh_token(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE refresh_tokens SET is_revoked = true WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn revoke_user_refresh_tokens(&self, user_id: i32) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET is_revoked = true
             WHERE user_id = $1 AND is_revoked = false",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Removes rows that can never be used again.
    pub async fn purge_stale_refresh_tokens(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM refresh_tokens WHERE expires_at < $1 OR is_revoked = true",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[tokio::test]
    async fn database_new_returns_error_on_invalid_url() {
        let mut config = test_config();
        config.database_url = "not-a-url".to_string();
        let result = Database::new(&config).await;
        assert!(result.is_err());
    }
}
