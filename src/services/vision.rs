// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OpenAI vision client for receipt verification and line-item extraction.
//!
//! The model answers in free text. Verification expects a bare yes/no and
//! extraction expects one `name: price` line per item plus `tax:` and
//! `payment:` lines; both answers are parsed leniently and anything
//! unparseable is dropped.

use crate::error::AppError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

const VERIFY_PROMPT: &str = "Is this image a photo or scan of a store receipt? \
     Answer with a single word: yes or no.";

const EXTRACT_PROMPT: &str = "List every purchased item on this receipt, one per line, \
     formatted exactly as `item name: price`. Write prices as plain numbers \
     without currency symbols. Do not list the subtotal or total. \
     Then add a line `tax: amount`, using 0 if no tax is shown. \
     Finish with a line `payment: method` naming the card brand or tender \
     used (for example Visa, Mastercard, Amex, Debit or Cash), or \
     `payment: unknown` if it is not shown.";

const VERIFY_MAX_TOKENS: u32 = 5;
const EXTRACT_MAX_TOKENS: u32 = 1000;

/// An image to send to the model.
#[derive(Debug, Clone)]
pub struct ReceiptImage<'a> {
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

impl ReceiptImage<'_> {
    /// Encode as a `data:` URL for the image_url content part.
    fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, BASE64.encode(self.bytes))
    }
}

/// A line item as read off the receipt, before categorization.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedItem {
    pub name: String,
    pub price: f64,
}

/// Result of parsing the extraction answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedReceipt {
    pub items: Vec<ParsedItem>,
    pub tax: f64,
    pub payment_method: Option<String>,
}

/// OpenAI-compatible vision chat client.
#[derive(Clone)]
pub struct VisionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl VisionClient {
    pub fn new(base_url: &str, api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    /// Ask the model whether the image is a receipt.
    pub async fn verify_receipt(&self, image: &ReceiptImage<'_>) -> Result<bool, AppError> {
        let answer = self.ask(VERIFY_PROMPT, image, VERIFY_MAX_TOKENS).await?;
        let is_receipt = is_affirmative(&answer);
        tracing::debug!(answer = %answer, is_receipt, "Receipt verification answered");
        Ok(is_receipt)
    }

    /// Ask the model for the receipt's line items and tax.
    pub async fn extract_items(&self, image: &ReceiptImage<'_>) -> Result<ParsedReceipt, AppError> {
        let answer = self.ask(EXTRACT_PROMPT, image, EXTRACT_MAX_TOKENS).await?;
        let parsed = parse_line_items(&answer);
        tracing::debug!(
            lines = answer.lines().count(),
            items = parsed.items.len(),
            tax = parsed.tax,
            "Receipt extraction answered"
        );
        Ok(parsed)
    }

    /// One chat completion with a text prompt and a single image.
    async fn ask(
        &self,
        prompt: &str,
        image: &ReceiptImage<'_>,
        max_tokens: u32,
    ) -> Result<String, AppError> {
        let request = ChatRequest {
            model: &self.model,
            max_tokens,
            messages: vec![ChatRequestMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.data_url(),
                        },
                    },
                ],
            }],
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::VisionApi(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                tracing::warn!("Vision API rate limit hit (429)");
            }
            return Err(AppError::VisionApi(format!("HTTP {}: {}", status, body)));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::VisionApi(format!("JSON parse error: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::VisionApi("Response had no message content".to_string()))
    }
}

// ─── Wire types ──────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatRequestMessage>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequestMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

// ─── Answer parsing ──────────────────────────────────────────

/// Strip punctuation and surrounding whitespace, then lowercase.
pub fn normalize_answer(answer: &str) -> String {
    answer
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect::<String>()
        .trim()
        .to_lowercase()
}

/// Whether a yes/no answer means yes.
pub fn is_affirmative(answer: &str) -> bool {
    normalize_answer(answer) == "yes"
}

/// Parse `name: price` lines into items plus a tax amount.
///
/// Splits on the last colon so names may contain colons. Rows labelled as
/// tax (`Tax`, `Sales Tax`, `Tax (8%)`) add to the tax; `total`/`subtotal`
/// rows are ignored since the total is recomputed from the items. A
/// `payment:` row names the payment method.
pub fn parse_line_items(text: &str) -> ParsedReceipt {
    let mut parsed = ParsedReceipt::default();

    for line in text.lines() {
        let line = line
            .trim()
            .trim_start_matches(|c: char| c == '-' || c == '*' || c == '•')
            .trim();

        let Some((name, value)) = line.rsplit_once(':') else {
            continue;
        };

        let name = name.trim().trim_matches('*').trim();
        if name.is_empty() {
            continue;
        }

        if is_payment_label(name) {
            parsed.payment_method = parse_payment_method(value);
            continue;
        }

        let Some(price) = parse_price(value) else {
            continue;
        };

        if has_word(name, &["tax"]) {
            parsed.tax += price;
        } else if has_word(name, &["total", "subtotal"]) {
            continue;
        } else {
            parsed.items.push(ParsedItem {
                name: name.to_string(),
                price,
            });
        }
    }

    parsed
}

/// Whether any alphanumeric word of `label` is one of `words`.
fn has_word(label: &str, words: &[&str]) -> bool {
    label
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| words.iter().any(|target| w.eq_ignore_ascii_case(target)))
}

fn is_payment_label(name: &str) -> bool {
    name.eq_ignore_ascii_case("payment") || name.eq_ignore_ascii_case("payment method")
}

fn parse_payment_method(raw: &str) -> Option<String> {
    let method = raw.trim().trim_matches('*').trim();
    let unknown = ["", "unknown", "none", "n/a"];
    if unknown.iter().any(|u| method.eq_ignore_ascii_case(u)) {
        None
    } else {
        Some(method.to_string())
    }
}

/// Parse a price like `3.49`, `$3.49` or `1,299.00`.
fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_matches('*')
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
}
