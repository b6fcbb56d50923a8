/// A channel-ready message body. Text goes to the free-text and SMS
/// channels; Template goes to the pre-registered WhatsApp template.
#[derive(Debug, Clone, PartialEq)]
pub enum ComposedMessage {
    Text { body: String },
    Template { template_id: String, args: Vec<String> },
}

impl ComposedMessage {
    pub fn len(&self) -> usize {
        match self {
            Self::Text { body } => body.chars().count(),
            Self::Template { args, .. } => args.iter().map(|a| a.chars().count()).sum(),
        }
    }
}

pub fn format_amount(amount: f64) -> String {
    format!("₹{:.2}", amount)
}

pub fn invoice_text(
    customer_name: &str,
    order_number: &str,
    total_amount: f64,
    invoice_link: &str,
) -> ComposedMessage {
    ComposedMessage::Text {
        body: format!(
            "Hi {}, your invoice for order {} is ready. Amount due: {}. View and pay here: {}",
            customer_name.trim(),
            order_number.trim(),
            format_amount(total_amount),
            invoice_link,
        ),
    }
}

/// Argument order is the wire contract with the template registered at the
/// provider. Reordering or adding arguments breaks rendering silently: the
/// provider accepts the call and fills the wrong placeholders.
pub fn invoice_template(
    template_id: &str,
    customer_name: &str,
    order_number: &str,
    total_amount: f64,
    invoice_link: &str,
) -> ComposedMessage {
    ComposedMessage::Template {
        template_id: template_id.to_string(),
        args: vec![
            customer_name.trim().to_string(),
            order_number.trim().to_string(),
            format!("{:.2}", total_amount),
            invoice_link.to_string(),
        ],
    }
}

pub fn advance_payment_text(
    customer_name: &str,
    order_number: &str,
    invoice_link: &str,
) -> ComposedMessage {
    ComposedMessage::Text {
        body: format!(
            "Hi {}, we've received your advance payment for order {}. Thank you! Track your order here: {}",
            customer_name.trim(),
            order_number.trim(),
            invoice_link,
        ),
    }
}

pub fn payment_completion_text(
    customer_name: &str,
    order_number: &str,
    final_amount: f64,
    invoice_link: &str,
) -> ComposedMessage {
    ComposedMessage::Text {
        body: format!(
            "Hi {}, your payment of {} for order {} is complete. Thank you for shopping with us! Receipt: {}",
            customer_name.trim(),
            format_amount(final_amount),
            order_number.trim(),
            invoice_link,
        ),
    }
}
