use crate::config::TOKEN_TTL_HOURS;

/// Subject and bodies of the magic-link login email.
pub struct MagicLinkEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl MagicLinkEmail {
    pub fn new(verify_url: &str) -> Self {
        Self {
            subject: "Your login link for Buyer Lead App".to_string(),
            text: Self::text_template(verify_url),
            html: Self::html_template(verify_url),
        }
    }

    fn text_template(verify_url: &str) -> String {
        format!(
            r#"Login to Buyer Lead App

Open the link below to log in to your account:

{verify_url}

This link will expire in {TOKEN_TTL_HOURS} hours.

If you didn't request this email, you can safely ignore it."#
        )
    }

    fn html_template(verify_url: &str) -> String {
        format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h1 style="color: #333;">Login to Buyer Lead App</h1>
  <p>Click the link below to log in to your account:</p>
  <a href="{verify_url}" style="display: inline-block; background-color: #4F46E5; color: white; padding: 10px 20px; text-decoration: none; border-radius: 5px; margin: 20px 0;">Log in to Buyer Lead App</a>
  <p>Or copy and paste this URL into your browser:</p>
  <p style="word-break: break-all; color: #666;">{verify_url}</p>
  <p>This link will expire in {TOKEN_TTL_HOURS} hours.</p>
  <p>If you didn't request this email, you can safely ignore it.</p>
</div>"#
        )
    }
}
