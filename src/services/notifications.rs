//! Transactional email sent to customers, delivered through the Resend HTTP API.
use askama::Template;
use async_trait::async_trait;
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use time::{macros::format_description, OffsetDateTime};

use super::payments::PostalAddress;

/// Subject line of the order confirmation email.
pub const ORDER_RECEIVED_SUBJECT: &str = "Thanks for your order!";

/// Everything needed to tell a customer their order was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceivedEmail {
    /// Recipient address.
    pub to: String,
    pub order_id: String,
    /// When the order was placed.
    pub order_date: OffsetDateTime,
    /// The addressee of the shipment.
    pub shipping_name: String,
    pub shipping_address: PostalAddress,
}

/// A fully rendered email, ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: &'static str,
    pub html: String,
    pub text: String,
}

/// HTML template for the order received email.
#[derive(Template)]
#[template(path = "email/order_received.html")]
struct OrderReceivedHtml<'a> {
    order_id: &'a str,
    order_date: &'a str,
    name: &'a str,
    street: &'a str,
    locality: &'a str,
    country: &'a str,
}

/// Plain text template for the order received email.
#[derive(Template)]
#[template(path = "email/order_received.txt")]
struct OrderReceivedText<'a> {
    order_id: &'a str,
    order_date: &'a str,
    name: &'a str,
    street: &'a str,
    locality: &'a str,
    country: &'a str,
}

/// Format a date the way customers see it in emails, e.g. `7/4/2025`.
pub fn format_order_date(date: OffsetDateTime) -> String {
    date.format(format_description!("[month padding:none]/[day padding:none]/[year]"))
        .unwrap_or_else(|_| date.date().to_string())
}

impl OrderReceivedEmail {
    /// Render the HTML and plain text bodies of this email.
    pub fn render(&self) -> Result<RenderedEmail, errors::EmailError> {
        let order_date = format_order_date(self.order_date);
        let address = &self.shipping_address;
        let locality = match address.state {
            Some(ref state) => format!("{}, {} {}", address.city, state, address.postal_code),
            None => format!("{} {}", address.city, address.postal_code),
        };
        let html = OrderReceivedHtml {
            order_id: &self.order_id,
            order_date: &order_date,
            name: &self.shipping_name,
            street: &address.street,
            locality: &locality,
            country: &address.country,
        }
        .render()?;
        let text = OrderReceivedText {
            order_id: &self.order_id,
            order_date: &order_date,
            name: &self.shipping_name,
            street: &address.street,
            locality: &locality,
            country: &address.country,
        }
        .render()?;
        Ok(RenderedEmail {
            subject: ORDER_RECEIVED_SUBJECT,
            html,
            text,
        })
    }
}

/// Sends order emails to customers.
#[async_trait]
pub trait OrderMailer: Send + Sync {
    /// Send the order received email, returning the provider's message ID.
    async fn send_order_email(
        &self,
        email: &OrderReceivedEmail,
    ) -> Result<String, errors::EmailError>;
}

/// Request body accepted by the Resend `POST /emails` endpoint.
#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// An `OrderMailer` backed by the Resend HTTP API.
pub struct ResendMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: SecretString,
    from_address: String,
}

impl ResendMailer {
    /// Construct a mailer which submits emails to `api_url` as `from_address`.
    pub fn new(api_url: &str, api_key: SecretString, from_address: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.to_owned(),
            api_key,
            from_address: from_address.to_owned(),
        }
    }
}

#[async_trait]
impl OrderMailer for ResendMailer {
    async fn send_order_email(
        &self,
        email: &OrderReceivedEmail,
    ) -> Result<String, errors::EmailError> {
        let rendered = email.render()?;
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&SendEmailRequest {
                from: &self.from_address,
                to: [email.to.as_str()],
                subject: rendered.subject,
                html: &rendered.html,
                text: &rendered.text,
            })
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(errors::EmailError::Rejected { status, body });
        }
        let SendEmailResponse { id } = response.json().await?;
        tracing::debug!(order_id = %email.order_id, "Order email accepted by provider");
        Ok(id)
    }
}

pub mod errors {
    use reqwest::StatusCode;
    use thiserror::Error;

    /// Errors that can occur when sending email.
    #[derive(Debug, Error)]
    pub enum EmailError {
        /// Template rendering error.
        #[error("Template error: {0}")]
        Template(#[from] askama::Error),
        /// The provider could not be reached or replied with garbage.
        #[error("Email transport error: {0}")]
        Transport(#[from] reqwest::Error),
        /// The provider refused the email.
        #[error("Email provider rejected the message ({status}): {body}")]
        Rejected { status: StatusCode, body: String },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{json, Value};
    use time::macros::datetime;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    fn email(state: Option<&str>) -> OrderReceivedEmail {
        OrderReceivedEmail {
            to: String::from("jane@example.com"),
            order_id: String::from("ord_1"),
            order_date: datetime!(2025-07-04 10:30 UTC),
            shipping_name: String::from("Jane <Doe>"),
            shipping_address: PostalAddress {
                street: String::from("1 Ship Street"),
                city: String::from("San Francisco"),
                postal_code: String::from("94103"),
                country: String::from("US"),
                state: state.map(str::to_owned),
            },
        }
    }

    #[test]
    fn order_date_is_month_day_year_without_padding() {
        assert_eq!(format_order_date(datetime!(2025-07-04 10:30 UTC)), "7/4/2025");
        assert_eq!(format_order_date(datetime!(2024-12-25 0:00 UTC)), "12/25/2024");
    }

    #[test]
    fn renders_order_details_into_both_bodies() {
        let rendered = email(Some("CA")).render().expect("templates render");
        assert_eq!(rendered.subject, ORDER_RECEIVED_SUBJECT);
        for body in [&rendered.html, &rendered.text] {
            assert!(body.contains("ord_1"));
            assert!(body.contains("7/4/2025"));
            assert!(body.contains("1 Ship Street"));
            assert!(body.contains("San Francisco, CA 94103"));
            assert!(body.contains("US"));
        }
    }

    #[test]
    fn html_body_escapes_customer_input() {
        let rendered = email(None).render().expect("templates render");
        assert!(
            rendered.html.contains("Jane &#60;Doe&#62;")
                || rendered.html.contains("Jane &lt;Doe&gt;")
        );
        assert!(rendered.text.contains("Jane <Doe>"));
        assert!(rendered.text.contains("San Francisco 94103"));
    }

    fn mailer(server: &MockServer) -> ResendMailer {
        ResendMailer::new(
            &format!("{}/emails", server.uri()),
            SecretString::from(String::from("re_test_key")),
            "shop@example.com",
        )
    }

    #[tokio::test]
    async fn posts_rendered_email_to_provider() {
        let server = MockServer::start().await;
        let accepted = json!({ "id": "msg_123" });
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/emails"))
            .and(matchers::header("authorization", "Bearer re_test_key"))
            .and(matchers::body_partial_json(json!({
                "from": "shop@example.com",
                "to": ["jane@example.com"],
                "subject": ORDER_RECEIVED_SUBJECT,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(accepted))
            .expect(1)
            .mount(&server)
            .await;

        let id = mailer(&server)
            .send_order_email(&email(Some("CA")))
            .await
            .expect("provider accepts the email");
        assert_eq!(id, "msg_123");

        let requests = server.received_requests().await.expect("recording enabled");
        let body: Value = requests[0].body_json().expect("json request body");
        let rendered = email(Some("CA")).render().expect("templates render");
        assert_eq!(body["html"], json!(rendered.html));
        assert_eq!(body["text"], json!(rendered.text));
    }

    #[tokio::test]
    async fn provider_refusal_is_rejected_error() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad recipient"))
            .mount(&server)
            .await;

        let result = mailer(&server).send_order_email(&email(None)).await;

        match result {
            Err(errors::EmailError::Rejected { status, body }) => {
                assert_eq!(status, reqwest::StatusCode::UNPROCESSABLE_ENTITY);
                assert_eq!(body, "bad recipient");
            }
            other => panic!("expected a rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_without_message_id_is_transport_error() {
        let server = MockServer::start().await;
        let queued = json!({ "status": "queued" });
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(queued))
            .mount(&server)
            .await;

        let result = mailer(&server).send_order_email(&email(None)).await;

        assert!(matches!(result, Err(errors::EmailError::Transport(_))));
    }
}
