use serde::Serialize;

use crate::models::reminder::{Priority, ReminderRow};

/// e.g. "Sunday, March 1, 2026 09:30 AM"
const DUE_DATE_FORMAT: &str = "%A, %B %-d, %Y %I:%M %p";

const SIGN_OFF: &str = "You can view and manage this reminder in your JobTrail application.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Everything outside the reminder row that the email mentions.
#[derive(Debug, Clone, Default)]
pub struct EmailContext {
    pub recipient_name: String,
    pub recipient_email: String,
    /// "Company - Title"
    pub related_job: Option<String>,
    /// "Name (Company)"
    pub related_contact: Option<String>,
}

pub fn render_reminder_email(reminder: &ReminderRow, ctx: &EmailContext) -> ReminderEmail {
    let due = reminder.due_date.format(DUE_DATE_FORMAT).to_string();
    let details = reminder
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty());

    let mut text = format!(
        "Hi {},\n\nThis is a reminder for: {}\n\nDue date: {due}\nPriority: {}\n",
        ctx.recipient_name, reminder.title, reminder.priority
    );
    if let Some(details) = details {
        text.push_str(&format!("Details: {details}\n"));
    }
    if let Some(job) = &ctx.related_job {
        text.push_str(&format!("Related job: {job}\n"));
    }
    if let Some(contact) = &ctx.related_contact {
        text.push_str(&format!("Related contact: {contact}\n"));
    }
    text.push_str(&format!("\n{SIGN_OFF}\n\nBest regards,\nJobTrail\n"));

    let (badge_bg, badge_fg) = priority_colors(&reminder.priority);
    let mut rows = vec![
        format!("<p><strong>Due date:</strong> {}</p>", escape_html(&due)),
        format!(
            "<p><strong>Priority:</strong> <span style=\"display:inline-block;padding:2px 8px;\
             border-radius:12px;font-size:12px;background-color:{badge_bg};color:{badge_fg};\">{}</span></p>",
            escape_html(&reminder.priority)
        ),
    ];
    if let Some(details) = details {
        rows.push(format!("<p><strong>Details:</strong> {}</p>", escape_html(details)));
    }
    if let Some(job) = &ctx.related_job {
        rows.push(format!("<p><strong>Related job:</strong> {}</p>", escape_html(job)));
    }
    if let Some(contact) = &ctx.related_contact {
        rows.push(format!(
            "<p><strong>Related contact:</strong> {}</p>",
            escape_html(contact)
        ));
    }

    let html = format!(
        "<div style=\"font-family:Arial,sans-serif;max-width:600px;margin:0 auto;\">\
         <h2 style=\"color:#4a6ee0;\">Reminder: {title}</h2>\
         <p>Hi {name},</p>\
         <p>This is a reminder for your upcoming task.</p>\
         <div style=\"background-color:#f7f9fc;padding:15px;border-radius:5px;margin:15px 0;\">{rows}</div>\
         <p>{SIGN_OFF}</p>\
         <p style=\"margin-top:20px;\">Best regards,<br>JobTrail</p>\
         </div>",
        title = escape_html(&reminder.title),
        name = escape_html(&ctx.recipient_name),
        rows = rows.concat(),
    );

    ReminderEmail {
        to: ctx.recipient_email.clone(),
        subject: format!("Reminder: {}", reminder.title),
        text,
        html,
    }
}

/// (background, foreground) for the priority badge.
fn priority_colors(priority: &str) -> (&'static str, &'static str) {
    if priority == Priority::High.as_str() {
        ("#fee2e2", "#dc2626")
    } else if priority == Priority::Medium.as_str() {
        ("#fef3c7", "#d97706")
    } else {
        ("#dcfce7", "#059669")
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
