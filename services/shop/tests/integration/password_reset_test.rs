use chrono::{Duration, Utc};

use bazaar_shop::domain::otp::OtpSettings;
use bazaar_shop::domain::password::verify_password;
use bazaar_shop::domain::types::PasswordReset;
use bazaar_shop::error::ShopServiceError;
use bazaar_shop::usecase::password_reset::{
    ChangePasswordInput, ChangePasswordUseCase, ForgotPasswordUseCase, ResendResetOtpUseCase,
    ResetPasswordInput, ResetPasswordUseCase, VerifyResetOtpInput, VerifyResetOtpUseCase,
};
use bazaar_shop::usecase::token::{TokenSettings, issue_pair};

use crate::helpers::{
    MockMailer, MockStore, StaleReads, TEST_JWT_SECRET, TEST_PASSWORD, inactive_user, test_user,
};

fn forgot_uc(
    store: &MockStore,
    mailer: &MockMailer,
) -> ForgotPasswordUseCase<MockStore, MockStore, MockMailer> {
    ForgotPasswordUseCase {
        users: store.clone(),
        resets: store.clone(),
        mailer: mailer.clone(),
        otp: OtpSettings::default(),
    }
}

fn verify_uc(store: &MockStore) -> VerifyResetOtpUseCase<MockStore, MockStore> {
    VerifyResetOtpUseCase {
        users: store.clone(),
        resets: store.clone(),
        otp: OtpSettings::default(),
        secret: TEST_JWT_SECRET.to_owned(),
    }
}

fn reset_uc(
    store: &MockStore,
    mailer: &MockMailer,
) -> ResetPasswordUseCase<MockStore, MockMailer> {
    ResetPasswordUseCase {
        resets: store.clone(),
        mailer: mailer.clone(),
        secret: TEST_JWT_SECRET.to_owned(),
    }
}

/// An open reset record whose last email went out long enough ago to allow another.
fn aged_reset(user_id: uuid::Uuid) -> PasswordReset {
    let settings = OtpSettings::default();
    let now = Utc::now();
    let mut reset = PasswordReset::issue(user_id, now, &settings);
    reset.last_email_at = Some(now - Duration::minutes(5));
    reset
}

// ── ForgotPassword ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_mail_reset_code_to_active_user() {
    let user = test_user("ana@example.com");
    let store = MockStore::new().with_user(user.clone());
    let mailer = MockMailer::new();

    forgot_uc(&store, &mailer).execute("ana@example.com").await.unwrap();

    let resets = store.resets_of(user.id);
    assert_eq!(resets.len(), 1);
    assert_eq!(resets[0].email_attempts, 1);
    assert_eq!(mailer.last_code_for("ana@example.com"), Some(resets[0].otp.clone()));
}

#[tokio::test]
async fn should_not_reveal_unknown_or_inactive_email() {
    let store = MockStore::new().with_user(inactive_user("idle@example.com"));
    let mailer = MockMailer::new();

    forgot_uc(&store, &mailer).execute("ghost@example.com").await.unwrap();
    forgot_uc(&store, &mailer).execute("idle@example.com").await.unwrap();

    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn should_withhold_second_email_within_a_minute() {
    let user = test_user("ana@example.com");
    let store = MockStore::new().with_user(user.clone());
    let mailer = MockMailer::new();
    let uc = forgot_uc(&store, &mailer);

    uc.execute("ana@example.com").await.unwrap();
    let first_code = store.resets_of(user.id)[0].otp.clone();
    uc.execute("ana@example.com").await.unwrap();

    assert_eq!(mailer.sent().len(), 1);
    let resets = store.resets_of(user.id);
    assert_eq!(resets.len(), 1);
    assert_eq!(resets[0].email_attempts, 1);
    assert_eq!(resets[0].otp, first_code);
}

#[tokio::test]
async fn should_cap_reset_emails_per_day() {
    let user = test_user("ana@example.com");
    let mut reset = aged_reset(user.id);
    reset.email_attempts = OtpSettings::default().reset_max_emails_per_day;
    let store = MockStore::new().with_user(user.clone()).with_reset(reset);
    let mailer = MockMailer::new();

    forgot_uc(&store, &mailer).execute("ana@example.com").await.unwrap();

    assert!(mailer.sent().is_empty());
    assert_eq!(
        store.resets_of(user.id)[0].email_attempts,
        OtpSettings::default().reset_max_emails_per_day
    );
}

#[tokio::test]
async fn should_answer_throttled_and_unknown_emails_alike() {
    let user = test_user("ana@example.com");
    let store = MockStore::new().with_user(user.clone());
    let mailer = MockMailer::new();
    let forgot = forgot_uc(&store, &mailer);
    let resend = ResendResetOtpUseCase {
        users: store.clone(),
        resets: store.clone(),
        mailer: mailer.clone(),
        otp: OtpSettings::default(),
    };

    forgot.execute("ana@example.com").await.unwrap();

    for email in ["ana@example.com", "ghost@example.com"] {
        let again = forgot.execute(email).await;
        assert!(again.is_ok(), "forgot for {email}: {again:?}");
        let resent = resend.execute(email).await;
        assert!(resent.is_ok(), "resend for {email}: {resent:?}");
    }
    assert_eq!(mailer.sent().len(), 1);
}

#[tokio::test]
async fn should_reissue_code_on_resend() {
    let user = test_user("ana@example.com");
    let reset = aged_reset(user.id);
    let store = MockStore::new().with_user(user.clone()).with_reset(reset);
    let mailer = MockMailer::new();

    ResendResetOtpUseCase {
        users: store.clone(),
        resets: store.clone(),
        mailer: mailer.clone(),
        otp: OtpSettings::default(),
    }
    .execute("ana@example.com")
    .await
    .unwrap();

    let resets = store.resets_of(user.id);
    assert_eq!(resets.len(), 1);
    assert_eq!(resets[0].email_attempts, 2);
    assert_eq!(mailer.last_code_for("ana@example.com"), Some(resets[0].otp.clone()));
}

#[tokio::test]
async fn should_ignore_resend_without_open_request() {
    let user = test_user("ana@example.com");
    let store = MockStore::new().with_user(user.clone());
    let mailer = MockMailer::new();

    ResendResetOtpUseCase {
        users: store.clone(),
        resets: store.clone(),
        mailer: mailer.clone(),
        otp: OtpSettings::default(),
    }
    .execute("ana@example.com")
    .await
    .unwrap();

    assert!(store.resets_of(user.id).is_empty());
    assert!(mailer.sent().is_empty());
}

// ── VerifyResetOtp / ResetPassword ───────────────────────────────────────────

#[tokio::test]
async fn should_reset_password_with_verified_code() {
    let user = test_user("ana@example.com");
    let store = MockStore::new().with_user(user.clone());
    let mailer = MockMailer::new();
    let pair = issue_pair(&store, &user, &TokenSettings::new(TEST_JWT_SECRET))
        .await
        .unwrap();

    forgot_uc(&store, &mailer).execute("ana@example.com").await.unwrap();
    let code = mailer.last_code_for("ana@example.com").unwrap();
    let token = verify_uc(&store)
        .execute(VerifyResetOtpInput {
            email: "ana@example.com".to_string(),
            otp: code,
        })
        .await
        .unwrap();

    reset_uc(&store, &mailer)
        .execute(ResetPasswordInput {
            token: token.clone(),
            new_password: "brand-new-secret".to_string(),
        })
        .await
        .unwrap();

    let stored = store.user(user.id).unwrap();
    assert!(verify_password("brand-new-secret", &stored.password_hash).unwrap());
    assert!(store.resets_of(user.id)[0].is_used);
    let revoked = store
        .tokens_of(user.id)
        .into_iter()
        .find(|t| t.jti == pair.refresh_jti)
        .unwrap();
    assert!(revoked.revoked_at.is_some(), "sessions must be revoked");
    assert_eq!(mailer.sent().last().unwrap().subject, "Your password was changed");

    // A used token cannot be redeemed twice.
    let result = reset_uc(&store, &mailer)
        .execute(ResetPasswordInput {
            token,
            new_password: "another-secret".to_string(),
        })
        .await;
    assert!(
        matches!(result, Err(ShopServiceError::InvalidToken)),
        "expected InvalidToken, got {result:?}"
    );
}

#[tokio::test]
async fn should_lock_reset_after_three_wrong_codes() {
    let user = test_user("ana@example.com");
    let reset = aged_reset(user.id);
    let right = reset.otp.clone();
    let wrong = if right == "999999" { "100000" } else { "999999" };
    let store = MockStore::new().with_user(user.clone()).with_reset(reset);
    let uc = verify_uc(&store);

    for _ in 0..3 {
        let result = uc
            .execute(VerifyResetOtpInput {
                email: user.email.clone(),
                otp: wrong.to_string(),
            })
            .await;
        assert!(
            matches!(result, Err(ShopServiceError::InvalidOtp)),
            "expected InvalidOtp, got {result:?}"
        );
    }

    let result = uc
        .execute(VerifyResetOtpInput {
            email: user.email.clone(),
            otp: right,
        })
        .await;
    assert!(
        matches!(result, Err(ShopServiceError::TooManyOtpAttempts)),
        "expected TooManyOtpAttempts, got {result:?}"
    );
    let stored = &store.resets_of(user.id)[0];
    assert_eq!(stored.otp_attempts, 3);
    assert!(!stored.is_verified);
    assert!(stored.token.is_none());
}

#[tokio::test]
async fn should_hold_reset_attempt_cap_under_concurrent_guesses() {
    let user = test_user("ana@example.com");
    let reset = aged_reset(user.id);
    let right = reset.otp.clone();
    let wrong = if right == "999999" { "100000" } else { "999999" };
    let store = MockStore::new().with_user(user.clone()).with_reset(reset);
    let uc = VerifyResetOtpUseCase {
        users: store.clone(),
        resets: StaleReads(store.clone()),
        otp: OtpSettings::default(),
        secret: TEST_JWT_SECRET.to_owned(),
    };
    let guess = |otp: &str| VerifyResetOtpInput {
        email: user.email.clone(),
        otp: otp.to_string(),
    };

    let (a, b, c, d, e) = tokio::join!(
        uc.execute(guess(wrong)),
        uc.execute(guess(wrong)),
        uc.execute(guess(wrong)),
        uc.execute(guess(wrong)),
        uc.execute(guess(&right)),
    );

    let results = [a, b, c, d, e];
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(ShopServiceError::TooManyOtpAttempts)))
        .count();
    assert_eq!(refused, 2, "only three guesses may be evaluated: {results:?}");
    assert_eq!(store.resets_of(user.id)[0].otp_attempts, 3);
}

#[tokio::test]
async fn should_reject_expired_reset_code() {
    let user = test_user("ana@example.com");
    let mut reset = aged_reset(user.id);
    reset.expires_at = Utc::now() - Duration::seconds(1);
    let code = reset.otp.clone();
    let store = MockStore::new().with_user(user.clone()).with_reset(reset);

    let result = verify_uc(&store)
        .execute(VerifyResetOtpInput {
            email: user.email.clone(),
            otp: code,
        })
        .await;

    assert!(
        matches!(result, Err(ShopServiceError::InvalidOtp)),
        "expected InvalidOtp, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_forged_reset_token() {
    let store = MockStore::new();
    let mailer = MockMailer::new();

    let result = reset_uc(&store, &mailer)
        .execute(ResetPasswordInput {
            token: "not-a-token".to_string(),
            new_password: "brand-new-secret".to_string(),
        })
        .await;

    assert!(
        matches!(result, Err(ShopServiceError::InvalidToken)),
        "expected InvalidToken, got {result:?}"
    );
}

// ── ChangePassword ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_change_password_and_revoke_sessions() {
    let user = test_user("ana@example.com");
    let store = MockStore::new().with_user(user.clone());
    let mailer = MockMailer::new();
    issue_pair(&store, &user, &TokenSettings::new(TEST_JWT_SECRET))
        .await
        .unwrap();

    ChangePasswordUseCase {
        users: store.clone(),
        tokens: store.clone(),
        mailer: mailer.clone(),
    }
    .execute(ChangePasswordInput {
        user_id: user.id,
        old_password: TEST_PASSWORD.to_string(),
        new_password: "brand-new-secret".to_string(),
    })
    .await
    .unwrap();

    let stored = store.user(user.id).unwrap();
    assert!(verify_password("brand-new-secret", &stored.password_hash).unwrap());
    assert!(store.tokens_of(user.id).iter().all(|t| t.revoked_at.is_some()));
    assert_eq!(mailer.sent().len(), 1);
}

#[tokio::test]
async fn should_reject_wrong_old_password() {
    let user = test_user("ana@example.com");
    let store = MockStore::new().with_user(user.clone());

    let result = ChangePasswordUseCase {
        users: store.clone(),
        tokens: store.clone(),
        mailer: MockMailer::new(),
    }
    .execute(ChangePasswordInput {
        user_id: user.id,
        old_password: "guess-work".to_string(),
        new_password: "brand-new-secret".to_string(),
    })
    .await;

    assert!(
        matches!(result, Err(ShopServiceError::InvalidCredential)),
        "expected InvalidCredential, got {result:?}"
    );
}

#[tokio::test]
async fn should_change_password_even_if_confirmation_mail_fails() {
    let user = test_user("ana@example.com");
    let store = MockStore::new().with_user(user.clone());

    ChangePasswordUseCase {
        users: store.clone(),
        tokens: store.clone(),
        mailer: MockMailer::failing(),
    }
    .execute(ChangePasswordInput {
        user_id: user.id,
        old_password: TEST_PASSWORD.to_string(),
        new_password: "brand-new-secret".to_string(),
    })
    .await
    .unwrap();

    let stored = store.user(user.id).unwrap();
    assert!(verify_password("brand-new-secret", &stored.password_hash).unwrap());
}
