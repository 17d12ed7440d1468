use chrono::{DateTime, NaiveDate, Utc};

use super::form::{strip_data_uri, ApplicationForm};
use crate::config::MailConfig;

pub const SENDER_NAME: &str = "Model Application Form";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAttachment {
    pub filename: String,
    /// Base64 payload without any `data:` prefix.
    pub content: String,
    pub encoding: &'static str,
}

/// A fully rendered notification, independent of the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMail {
    pub from_name: &'static str,
    pub from_address: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
    pub attachments: Vec<MailAttachment>,
}

impl OutboundMail {
    pub fn from_application(
        form: &ApplicationForm,
        config: &MailConfig,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        let attachments: Vec<MailAttachment> = form
            .images()
            .into_iter()
            .map(|image| MailAttachment {
                filename: image
                    .filename
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{}.jpg", image.slot)),
                content: strip_data_uri(image.data).to_string(),
                encoding: "base64",
            })
            .collect();

        let sections = sections(form);
        let submitted = submitted_at.format("%B %d, %Y at %H:%M UTC").to_string();

        Self {
            from_name: SENDER_NAME,
            from_address: config.smtp_user.clone(),
            to: config.recipient.clone(),
            reply_to: form.email.trim().to_string(),
            subject: format!("New Model Application from {}", form.full_name()),
            text: render_text(&sections, &form.message, &attachments, &submitted),
            html: render_html(&sections, &form.message, &attachments, &submitted),
            attachments,
        }
    }
}

type Section = (&'static str, Vec<(&'static str, String)>);

fn sections(form: &ApplicationForm) -> Vec<Section> {
    vec![
        (
            "Personal Information",
            vec![
                ("Gender", form.gender.clone()),
                ("Name", form.full_name()),
                ("Email", form.email.clone()),
                ("Contact Number", form.contact_number.clone()),
                ("Date of Birth", format_birth_date(&form.date_of_birth)),
            ],
        ),
        (
            "Address",
            vec![
                ("Address", form.address.clone()),
                ("City", form.city.clone()),
                ("State", form.state.clone()),
                ("Zip Code", form.zip_code.clone()),
                ("Country", form.country.clone()),
            ],
        ),
        (
            "Physical Measurements",
            vec![
                ("Height", form.height.clone()),
                ("Bust", form.bust.clone()),
                ("Waist", form.waist.clone()),
                ("Hips", form.hips.clone()),
                ("Shoe Size", form.shoe_size.clone()),
                ("Hair Color", form.hair_color.clone()),
                ("Eye Color", form.eye_color.clone()),
            ],
        ),
        ("Social Media", vec![("Instagram", form.instagram.clone())]),
    ]
}

/// `1999-04-07` renders as `April 07, 1999`; anything else is shown as typed.
pub fn format_birth_date(raw: &str) -> String {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(|date| date.format("%B %d, %Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn render_text(sections: &[Section], message: &str, attachments: &[MailAttachment], submitted: &str) -> String {
    let mut text = String::from("New Model Application\n");
    for (title, fields) in sections {
        text.push_str(&format!("\n{title}:\n"));
        for (label, value) in fields {
            text.push_str(&format!("- {label}: {value}\n"));
        }
    }
    text.push_str(&format!("\nMessage:\n{message}\n"));
    if !attachments.is_empty() {
        text.push_str(&format!(
            "\nPortfolio Images: {} image(s) attached.\n",
            attachments.len()
        ));
    }
    text.push_str(&format!("\nSubmitted: {submitted}\n"));
    text
}

fn render_html(sections: &[Section], message: &str, attachments: &[MailAttachment], submitted: &str) -> String {
    let mut html = String::from(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head><body>\
         <div class=\"container\"><h1>New Model Application</h1>",
    );
    for (title, fields) in sections {
        html.push_str(&format!("<div class=\"section\"><h2>{title}</h2>"));
        for (label, value) in fields {
            html.push_str(&format!(
                "<div class=\"field\"><div class=\"label\">{label}:</div><div class=\"value\">{}</div></div>",
                escape_html(value)
            ));
        }
        html.push_str("</div>");
    }
    html.push_str(&format!(
        "<div class=\"section\"><h2>Message</h2><div class=\"value\">{}</div></div>",
        escape_html(message).replace('\n', "<br>")
    ));
    if !attachments.is_empty() {
        html.push_str(&format!(
            "<div class=\"section\"><h2>Portfolio Images</h2><p>{} image(s) attached to this email.</p><ul>",
            attachments.len()
        ));
        for attachment in attachments {
            html.push_str(&format!("<li>{}</li>", escape_html(&attachment.filename)));
        }
        html.push_str("</ul></div>");
    }
    html.push_str(&format!(
        "<p class=\"submitted\">Submitted {}</p></div></body></html>",
        escape_html(submitted)
    ));
    html
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
