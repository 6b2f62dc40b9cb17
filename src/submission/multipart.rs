use uuid::Uuid;

/// A multipart/form-data body made of text fields only.
#[derive(Debug, Clone)]
pub struct MultipartForm {
    boundary: String,
    fields: Vec<(String, String)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self {
            boundary: format!("posecap-{}", Uuid::new_v4().simple()),
            fields: Vec::new(),
        }
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut body = String::new();
        for (name, value) in &self.fields {
            body.push_str("--");
            body.push_str(&self.boundary);
            body.push_str("\r\n");
            body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                escape_name(name)
            ));
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str("--");
        body.push_str(&self.boundary);
        body.push_str("--\r\n");
        body.into_bytes()
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_name(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}
