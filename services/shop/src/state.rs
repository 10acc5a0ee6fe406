use axum::extract::FromRef;
use sea_orm::DatabaseConnection;

use bazaar_auth_types::cookie::CookieSettings;
use bazaar_auth_types::identity::JwtSecret;

use crate::config::ShopConfig;
use crate::domain::otp::OtpSettings;
use crate::infra::db::{
    DbActivationOtpRepository, DbAddressRepository, DbCartRepository, DbOrderRepository,
    DbPasswordResetRepository, DbProductRepository, DbRefreshTokenRepository, DbUserRepository,
};
use crate::infra::mail::AppMailer;
use crate::infra::storage::LocalScreenshotStore;
use crate::usecase::token::TokenSettings;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_secret: JwtSecret,
    pub tokens: TokenSettings,
    pub cookies: CookieSettings,
    pub otp: OtpSettings,
    pub mailer: AppMailer,
    pub screenshots: LocalScreenshotStore,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: &ShopConfig, mailer: AppMailer) -> Self {
        Self {
            db,
            jwt_secret: JwtSecret::new(config.jwt_secret.as_str()),
            tokens: config.token_settings(),
            cookies: config.cookie_settings(),
            otp: OtpSettings::default(),
            mailer,
            screenshots: LocalScreenshotStore::new(&config.upload_dir),
        }
    }

    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn otp_repo(&self) -> DbActivationOtpRepository {
        DbActivationOtpRepository {
            db: self.db.clone(),
        }
    }

    pub fn reset_repo(&self) -> DbPasswordResetRepository {
        DbPasswordResetRepository {
            db: self.db.clone(),
        }
    }

    pub fn token_repo(&self) -> DbRefreshTokenRepository {
        DbRefreshTokenRepository {
            db: self.db.clone(),
        }
    }

    pub fn product_repo(&self) -> DbProductRepository {
        DbProductRepository {
            db: self.db.clone(),
        }
    }

    pub fn cart_repo(&self) -> DbCartRepository {
        DbCartRepository {
            db: self.db.clone(),
        }
    }

    pub fn address_repo(&self) -> DbAddressRepository {
        DbAddressRepository {
            db: self.db.clone(),
        }
    }

    pub fn order_repo(&self) -> DbOrderRepository {
        DbOrderRepository {
            db: self.db.clone(),
        }
    }
}

impl FromRef<AppState> for JwtSecret {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_secret.clone()
    }
}
