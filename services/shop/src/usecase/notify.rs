//! Plain-text email bodies.

use crate::domain::types::OrderDetail;
use crate::domain::types::OutgoingEmail;

pub fn activation_otp(email: &str, code: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: vec![email.to_owned()],
        subject: "Your OTP for Account Verification".to_owned(),
        body: format!("Your OTP is: {code}\n\nIt expires in 5 minutes."),
    }
}

pub fn password_reset_otp(email: &str, code: &str, ttl_minutes: i64) -> OutgoingEmail {
    OutgoingEmail {
        to: vec![email.to_owned()],
        subject: "Password Reset Code".to_owned(),
        body: format!(
            "Your password reset code is: {code}\n\n\
             It expires in {ttl_minutes} minutes. If you did not request a reset, ignore this email."
        ),
    }
}

pub fn password_changed(email: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: vec![email.to_owned()],
        subject: "Your password was changed".to_owned(),
        body: "The password for your account was just changed. \
               If this was not you, reset your password immediately."
            .to_owned(),
    }
}

pub fn new_order(admin_emails: Vec<String>, detail: &OrderDetail) -> OutgoingEmail {
    let order = &detail.order;
    OutgoingEmail {
        to: admin_emails,
        subject: format!("New Order Received: {}", order.order_number),
        body: format!(
            "New order placed!\n\n\
             Order Number: {}\n\
             Customer: {}\n\
             Total Amount: \u{20b9}{}\n\
             Status: {}\n\n\
             Please verify the payment and update the order status.",
            order.order_number,
            detail.customer.email,
            order.total_amount,
            order.status.display_name(),
        ),
    }
}

pub fn order_status(detail: &OrderDetail, admin_notes: Option<&str>) -> OutgoingEmail {
    let order = &detail.order;
    let mut body = format!(
        "Hello {},\n\nYour order {} is now {}.\nTotal: \u{20b9}{}",
        detail.customer.username,
        order.order_number,
        order.status.display_name(),
        order.total_amount,
    );
    if let Some(notes) = admin_notes.filter(|n| !n.trim().is_empty()) {
        body.push_str(&format!("\n\nNotes: {notes}"));
    }
    OutgoingEmail {
        to: vec![detail.customer.email.clone()],
        subject: format!("Order {} {}", order.order_number, order.status),
        body,
    }
}
