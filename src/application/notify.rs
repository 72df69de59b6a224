use crate::domain::fine::{Fine, FineTier};
use crate::domain::user::User;
use rust_decimal::Decimal;

/// A composed message, ready for the notification sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub subject: &'static str,
    pub body: String,
}

pub const ACCOUNT_CREATED: &str = "Account Created";
pub const ACCOUNT_APPROVED: &str = "Account Approved";
pub const RETURN_OVERDUE: &str = "Return Overdue";
pub const FINE_TO_PAY: &str = "Fine To Pay";
pub const ACCOUNT_BLOCKED: &str = "Account Blocked";

fn wrap(user: &User, heading: &str, lines: &str) -> String {
    format!(
        "<html>\n<body>\n<h1>Hello, {}</h1>\n<{tag}>\n{lines}\n</{tag}>\n<h4>Thanks</h4>\n</body>\n</html>",
        user.full_name(),
        tag = heading,
    )
}

pub fn account_created(user: &User) -> Notice {
    Notice {
        subject: ACCOUNT_CREATED,
        body: wrap(
            user,
            "h2",
            "Your account has been created and an approval request has been sent to the admin.\n\
             Once the request is approved you will receive an email and will be able to log in.",
        ),
    }
}

pub fn account_approved(user: &User) -> Notice {
    Notice {
        subject: ACCOUNT_APPROVED,
        body: wrap(
            user,
            "h2",
            "Your account has been approved by the admin.\nNow you can log in to your account.",
        ),
    }
}

pub fn first_overdue(user: &User, book_title: &str, daily_fine: Decimal) -> Notice {
    Notice {
        subject: RETURN_OVERDUE,
        body: wrap(
            user,
            "h4",
            &format!(
                "Yesterday was your last day to return Book: {book_title}.\n\
                 From today, every day a fine of {daily_fine} will be added.\n\
                 Return the book as soon as possible."
            ),
        ),
    }
}

pub fn fine_reminder(user: &User, book_title: &str, amount: Fine) -> Notice {
    Notice {
        subject: FINE_TO_PAY,
        body: wrap(
            user,
            "h4",
            &format!(
                "You have a {amount} fine on Book: {book_title}.\n\
                 Return the book, and pay the fine as soon as possible."
            ),
        ),
    }
}

pub fn account_blocked(user: &User, book_title: &str, amount: Fine) -> Notice {
    Notice {
        subject: ACCOUNT_BLOCKED,
        body: wrap(
            user,
            "h4",
            &format!(
                "You have a {amount} fine on Book: {book_title}.\n\
                 Your account is BLOCKED.\n\
                 Please pay it as soon as possible to unblock your account."
            ),
        ),
    }
}

/// Notice for an order whose fine just entered `tier`. `None` for orders
/// that are not overdue.
pub fn overdue_notice(
    tier: FineTier,
    user: &User,
    book_title: &str,
    amount: Fine,
    daily_fine: Decimal,
) -> Option<Notice> {
    match tier {
        FineTier::None => None,
        FineTier::First => Some(first_overdue(user, book_title, daily_fine)),
        FineTier::Regular => Some(fine_reminder(user, book_title, amount)),
        FineTier::Critical => Some(account_blocked(user, book_title, amount)),
    }
}
