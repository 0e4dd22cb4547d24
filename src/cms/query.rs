//! Search queries in the Prismic predicate syntax

/// A single search predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `path` equals `value`
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::At {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Render as `[at(document.type,"posts")]`
    pub fn render(&self) -> String {
        match self {
            Predicate::At { path, value } => {
                format!("[at({},\"{}\")]", path, escape_value(value))
            }
        }
    }
}

fn escape_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// A document search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    pub fetch: Vec<String>,
    pub page_size: Option<usize>,
    pub page: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// All documents of one type
    pub fn of_type(doc_type: &str) -> Self {
        Self::new().predicate(Predicate::at("document.type", doc_type))
    }

    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Restrict the returned `data` to these fields (e.g. `posts.title`)
    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    /// The `q` parameter, e.g. `[[at(document.type,"posts")]]`
    pub fn q(&self) -> Option<String> {
        if self.predicates.is_empty() {
            return None;
        }
        let inner: String = self.predicates.iter().map(Predicate::render).collect();
        Some(format!("[{}]", inner))
    }

    /// Query-string parameters for the search endpoint (without `ref`)
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(q) = self.q() {
            params.push(("q", q));
        }
        if !self.fetch.is_empty() {
            params.push(("fetch", self.fetch.join(",")));
        }
        if let Some(page_size) = self.page_size {
            params.push(("pageSize", page_size.to_string()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        params
    }
}
