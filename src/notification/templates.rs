/// A rendered email, ready for the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub subject: String,
    pub html: String,
}

pub fn contact_thank_you(name: &str) -> Email {
    Email {
        subject: String::from("Thank you for contacting amahirwe!"),
        html: format!(
            r#"
            <div>
                <h1>Hello {},</h1>
                <p>Thank you for reaching out. We received your message and will get back to you soon.</p>
            </div>
        "#,
            escape(name)
        ),
    }
}

pub fn contact_admin_alert(contact_email: &str) -> Email {
    Email {
        subject: String::from("A new message, someone contacted us!"),
        html: format!(
            r#"
            <div>
                <h1>New contact message</h1>
                <p>{} has just sent a message. Log in to read and reply.</p>
            </div>
        "#,
            escape(contact_email)
        ),
    }
}

pub fn contact_reply(name: &str, question: &str, answer: &str) -> Email {
    Email {
        subject: String::from("New message! amahirwe replied!"),
        html: format!(
            r#"
            <div>
                <h1>Hello {},</h1>
                <p>You asked:</p>
                <blockquote>{}</blockquote>
                <p>Our answer:</p>
                <p>{}</p>
            </div>
        "#,
            escape(name),
            escape(question),
            escape(answer)
        ),
    }
}

pub fn subscribe_welcome(name: &str, client_url: &str) -> Email {
    let unsubscribe_link = format!("{}/unsubscribe", client_url);

    Email {
        subject: String::from("Thank you for subscribing to amahirwe!"),
        html: format!(
            r#"
            <div>
                <h1>Welcome to our newsletter, {}!</h1>
                <p>Changed your mind? Click <a href="{}">here</a> to unsubscribe.</p>
            </div>
        "#,
            escape(name),
            unsubscribe_link
        ),
    }
}

// Caller supplied text ends up inside HTML.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for char in text.chars() {
        match char {
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
