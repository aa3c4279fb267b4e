//! In-process fake of the hosted platform.
//!
//! A [`MockServer`] whose responders keep real state: tables of JSON rows
//! behind the row API and a user registry behind the auth API. It covers the
//! subset of the platform the storefront uses: `eq`, `is.null`, `ilike` and
//! `lte` filters, `order`, `limit`, embedded selections (to-one by
//! `{table}_id` column, to-many by the parent's `{table}_id`), `!inner`
//! embeds, `count=exact`, and `return=representation`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde_json::{Map, Value, json};
use url::Url;
use uuid::Uuid;
use wiremock::matchers::path_regex;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Lifetime of issued access tokens, in seconds.
const TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Default)]
struct Store {
    tables: HashMap<String, Vec<Value>>,
    users: Vec<FakeUser>,
    /// Access and refresh tokens, by the user they were issued to.
    tokens: HashMap<String, Uuid>,
}

struct FakeUser {
    id: Uuid,
    email: String,
    password: String,
    metadata: Value,
}

impl FakeUser {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "email": self.email,
            "user_metadata": self.metadata,
            "created_at": "2024-05-01T10:00:00Z",
        })
    }
}

/// Handle to a running fake platform. Cheap to clone.
#[derive(Clone)]
pub struct FakePlatform {
    server: Arc<MockServer>,
    store: Arc<Mutex<Store>>,
}

impl FakePlatform {
    /// Start the fake on an ephemeral port.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let store = Arc::new(Mutex::new(Store::default()));

        Mock::given(path_regex(r"^/rest/v1/[a-z_]+$"))
            .respond_with(RowApi(Arc::clone(&store)))
            .mount(&server)
            .await;
        Mock::given(path_regex(r"^/auth/v1/"))
            .respond_with(AuthApi(Arc::clone(&store)))
            .mount(&server)
            .await;

        Self {
            server: Arc::new(server),
            store,
        }
    }

    /// Base URL to configure the storefront with.
    #[must_use]
    pub fn url(&self) -> Url {
        Url::parse(&self.server.uri()).expect("mock server URI is a valid URL")
    }

    /// Insert rows into a table as-is.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        let mut store = self.lock();
        store
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Snapshot of a table's rows.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    /// Register an account and give it a role row. Returns the user id.
    pub fn add_user(&self, email: &str, password: &str, role: &str) -> Uuid {
        let id = Uuid::new_v4();
        let mut store = self.lock();
        store.users.push(FakeUser {
            id,
            email: email.to_string(),
            password: password.to_string(),
            metadata: json!({}),
        });
        store
            .tables
            .entry("user_roles".to_string())
            .or_default()
            .push(json!({
                "id": Uuid::new_v4(),
                "user_id": id,
                "role": role,
                "created_at": Utc::now().to_rfc3339(),
            }));
        id
    }

    /// Forget every token issued so far, as if the platform revoked them.
    pub fn revoke_all_tokens(&self) {
        self.lock().tokens.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().expect("fake platform store poisoned")
    }
}

// =============================================================================
// Row API
// =============================================================================

struct RowApi(Arc<Mutex<Store>>);

/// The query pairs of one row API request.
#[derive(Default)]
struct RowQuery {
    select: Option<String>,
    filters: Vec<(String, String)>,
    order: Option<(String, bool)>,
    limit: Option<usize>,
}

impl RowQuery {
    fn parse(url: &Url) -> Self {
        let mut query = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "select" => query.select = Some(value.into_owned()),
                "order" => {
                    let (column, direction) =
                        value.split_once('.').unwrap_or((value.as_ref(), "asc"));
                    query.order = Some((column.to_string(), direction == "desc"));
                }
                "limit" => query.limit = value.parse().ok(),
                _ => query.filters.push((key.into_owned(), value.into_owned())),
            }
        }
        query
    }
}

impl Respond for RowApi {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let table = request
            .url
            .path()
            .trim_start_matches("/rest/v1/")
            .to_string();
        let query = RowQuery::parse(&request.url);
        let prefer = request
            .headers
            .get("prefer")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let mut store = self.0.lock().expect("fake platform store poisoned");

        match request.method.as_str() {
            "GET" | "HEAD" => {
                let matching = store.matching(&table, &query);
                let mut rows: Vec<Value> = matching.into_iter().map(|(_, view)| view).collect();
                sort_rows(&mut rows, query.order.as_ref());
                let total = rows.len();
                if let Some(limit) = query.limit {
                    rows.truncate(limit);
                }

                let mut template = ResponseTemplate::new(200);
                if prefer.contains("count=exact") {
                    template = template.insert_header("Content-Range", content_range(total));
                }
                if request.method.as_str() == "HEAD" {
                    template
                } else {
                    template.set_body_json(rows)
                }
            }
            "POST" => {
                let Ok(Value::Array(new_rows)) = serde_json::from_slice::<Value>(&request.body)
                else {
                    return rejection(400, "expected an array of rows");
                };
                let ids: Vec<Value> = new_rows
                    .into_iter()
                    .map(|row| store.insert(&table, row))
                    .collect();
                if prefer.contains("return=representation") {
                    ResponseTemplate::new(201).set_body_json(store.views_by_id(&table, &ids, &query))
                } else {
                    ResponseTemplate::new(201)
                }
            }
            "PATCH" => {
                let Ok(Value::Object(patch)) = serde_json::from_slice::<Value>(&request.body)
                else {
                    return rejection(400, "expected an object");
                };
                let indices: Vec<usize> = store
                    .matching(&table, &query)
                    .into_iter()
                    .map(|(index, _)| index)
                    .collect();
                let mut ids = Vec::with_capacity(indices.len());
                if let Some(rows) = store.tables.get_mut(&table) {
                    for index in indices {
                        if let Some(Value::Object(row)) = rows.get_mut(index) {
                            for (key, value) in &patch {
                                row.insert(key.clone(), value.clone());
                            }
                            ids.push(row.get("id").cloned().unwrap_or(Value::Null));
                        }
                    }
                }
                ResponseTemplate::new(200).set_body_json(store.views_by_id(&table, &ids, &query))
            }
            "DELETE" => {
                let indices: Vec<usize> = store
                    .matching(&table, &query)
                    .into_iter()
                    .map(|(index, _)| index)
                    .collect();
                if let Some(rows) = store.tables.get_mut(&table) {
                    let mut index = 0;
                    rows.retain(|_| {
                        let keep = !indices.contains(&index);
                        index += 1;
                        keep
                    });
                }
                ResponseTemplate::new(204)
            }
            _ => rejection(405, "method not allowed"),
        }
    }
}

impl Store {
    /// Rows of `table` passing every filter, with their index and shaped view.
    fn matching(&self, table: &str, query: &RowQuery) -> Vec<(usize, Value)> {
        let Some(rows) = self.tables.get(table) else {
            return Vec::new();
        };
        rows.iter()
            .enumerate()
            .filter_map(|(index, row)| {
                let view = self.shape(table, row, query.select.as_deref().unwrap_or("*"))?;
                query
                    .filters
                    .iter()
                    .all(|(column, condition)| matches_filter(&view, row, column, condition))
                    .then_some((index, view))
            })
            .collect()
    }

    /// Shaped views of the rows with the given ids, in the given order.
    fn views_by_id(&self, table: &str, ids: &[Value], query: &RowQuery) -> Vec<Value> {
        let select = query.select.as_deref().unwrap_or("*");
        let rows = self.tables.get(table).map(Vec::as_slice).unwrap_or_default();
        ids.iter()
            .filter_map(|id| rows.iter().find(|row| row.get("id") == Some(id)))
            .filter_map(|row| self.shape(table, row, select))
            .collect()
    }

    /// Store a new row, filling `id` and timestamps. Returns its id.
    fn insert(&mut self, table: &str, mut row: Value) -> Value {
        let now = Value::String(Utc::now().to_rfc3339());
        if let Value::Object(fields) = &mut row {
            fields
                .entry("id")
                .or_insert_with(|| json!(Uuid::new_v4()));
            fields.entry("created_at").or_insert_with(|| now.clone());
            fields.entry("updated_at").or_insert(now);
        }
        let id = row.get("id").cloned().unwrap_or(Value::Null);
        self.tables.entry(table.to_string()).or_default().push(row);
        id
    }

    /// Apply a select string to a row. `None` if an `!inner` embed is empty.
    fn shape(&self, table: &str, row: &Value, select: &str) -> Option<Value> {
        let mut out = Map::new();
        for part in split_top_level(select) {
            let part = part.trim();
            if part == "*" {
                if let Value::Object(fields) = row {
                    out.extend(fields.clone());
                }
                continue;
            }
            let Some((head, rest)) = part.split_once('(') else {
                if let Some(value) = row.get(part) {
                    out.insert(part.to_string(), value.clone());
                }
                continue;
            };

            let columns = rest.strip_suffix(')').unwrap_or(rest);
            let (alias, target) = head.split_once(':').unwrap_or((head, head));
            let (target, inner) = match target.split_once('!') {
                Some((target, hint)) => (target, hint == "inner"),
                None => (target, false),
            };

            let embedded = self.embed(table, row, target, columns);
            if inner && matches!(embedded, Value::Null) {
                return None;
            }
            out.insert(alias.to_string(), embedded);
        }
        Some(Value::Object(out))
    }

    fn embed(&self, parent: &str, row: &Value, target: &str, columns: &str) -> Value {
        let rows = self.tables.get(target).map(Vec::as_slice).unwrap_or_default();

        // To-one when the parent row points at the target.
        if let Some(key) = row.get(foreign_key(target)) {
            return rows
                .iter()
                .find(|candidate| candidate.get("id") == Some(key))
                .and_then(|found| self.shape(target, found, columns))
                .unwrap_or(Value::Null);
        }

        let back_reference = foreign_key(parent);
        let id = row.get("id");
        Value::Array(
            rows.iter()
                .filter(|candidate| candidate.get(&back_reference) == id)
                .filter_map(|found| self.shape(target, found, columns))
                .collect(),
        )
    }
}

/// `categories` -> `category_id`, `products` -> `product_id`.
fn foreign_key(table: &str) -> String {
    match table.strip_suffix("ies") {
        Some(stem) => format!("{stem}y_id"),
        None => format!("{}_id", table.trim_end_matches('s')),
    }
}

/// Split a select string on commas that are not inside parentheses.
fn split_top_level(select: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0;
    for (index, c) in select.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.extend(select.get(start..index));
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.extend(select.get(start..));
    parts
}

/// Look a (possibly dotted) column up in the shaped view, then the raw row.
fn lookup<'a>(view: &'a Value, row: &'a Value, column: &str) -> Option<&'a Value> {
    let from = |root: &'a Value| {
        column
            .split('.')
            .try_fold(root, |value, segment| value.get(segment))
    };
    from(view).or_else(|| from(row))
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn matches_filter(view: &Value, row: &Value, column: &str, condition: &str) -> bool {
    let value = lookup(view, row, column).unwrap_or(&Value::Null);
    let (op, operand) = condition.split_once('.').unwrap_or((condition, ""));
    match op {
        "eq" => !value.is_null() && as_text(value) == operand,
        "is" if operand == "null" => value.is_null(),
        "ilike" => {
            let needle = operand.trim_matches('%').to_lowercase();
            value
                .as_str()
                .is_some_and(|text| text.to_lowercase().contains(&needle))
        }
        "lte" => match (as_number(value), operand.parse::<f64>()) {
            (Some(left), Ok(right)) => left <= right,
            _ => false,
        },
        _ => false,
    }
}

fn sort_rows(rows: &mut [Value], order: Option<&(String, bool)>) {
    let Some((column, descending)) = order else {
        return;
    };
    rows.sort_by(|a, b| {
        let (a, b) = (a.get(column), b.get(column));
        let ordering = match (a.and_then(as_number), b.and_then(as_number)) {
            (Some(left), Some(right)) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
            _ => a.map(as_text).cmp(&b.map(as_text)),
        };
        if *descending { ordering.reverse() } else { ordering }
    });
}

fn content_range(total: usize) -> String {
    if total == 0 {
        "*/0".to_string()
    } else {
        format!("0-{}/{total}", total - 1)
    }
}

fn rejection(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "code": "PGRST000",
        "message": message,
        "details": null,
        "hint": null,
    }))
}

// =============================================================================
// Auth API
// =============================================================================

struct AuthApi(Arc<Mutex<Store>>);

impl Respond for AuthApi {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut store = self.0.lock().expect("fake platform store poisoned");
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        let field = |name: &str| body.get(name).and_then(Value::as_str).unwrap_or_default();
        let bearer = request
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or_default()
            .to_string();

        match (request.method.as_str(), request.url.path()) {
            ("POST", "/auth/v1/signup") => {
                let email = field("email").to_lowercase();
                if store.users.iter().any(|user| user.email == email) {
                    return auth_rejection(422, json!({ "msg": "User already registered" }));
                }
                let id = Uuid::new_v4();
                store.users.push(FakeUser {
                    id,
                    email,
                    password: field("password").to_string(),
                    metadata: body.get("data").cloned().unwrap_or_else(|| json!({})),
                });
                store.issue_session(id)
            }
            ("POST", "/auth/v1/token") => {
                let grant = request
                    .url
                    .query_pairs()
                    .find(|(key, _)| key == "grant_type")
                    .map(|(_, value)| value.into_owned())
                    .unwrap_or_default();
                let user = if grant == "refresh_token" {
                    store.tokens.get(field("refresh_token")).copied()
                } else {
                    let email = field("email").to_lowercase();
                    store
                        .users
                        .iter()
                        .find(|user| user.email == email && user.password == field("password"))
                        .map(|user| user.id)
                };
                match user {
                    Some(id) => store.issue_session(id),
                    None if grant == "refresh_token" => auth_rejection(
                        400,
                        json!({ "error_description": "Invalid Refresh Token: Refresh Token Not Found" }),
                    ),
                    None => auth_rejection(
                        400,
                        json!({ "error_description": "Invalid login credentials" }),
                    ),
                }
            }
            ("GET", "/auth/v1/user") => match store.user_for(&bearer) {
                Some(user) => ResponseTemplate::new(200).set_body_json(user.to_json()),
                None => auth_rejection(401, json!({ "msg": "invalid JWT" })),
            },
            ("PUT", "/auth/v1/user") => {
                let Some(id) = store.tokens.get(&bearer).copied() else {
                    return auth_rejection(401, json!({ "msg": "invalid JWT" }));
                };
                let Some(user) = store.users.iter_mut().find(|user| user.id == id) else {
                    return auth_rejection(404, json!({ "msg": "User not found" }));
                };
                if let Some(password) = body.get("password").and_then(Value::as_str) {
                    user.password = password.to_string();
                }
                if let (Some(Value::Object(data)), Value::Object(metadata)) =
                    (body.get("data"), &mut user.metadata)
                {
                    metadata.extend(data.clone());
                }
                ResponseTemplate::new(200).set_body_json(user.to_json())
            }
            ("POST", "/auth/v1/logout") => {
                store.tokens.remove(&bearer);
                ResponseTemplate::new(204)
            }
            ("POST", "/auth/v1/recover") => ResponseTemplate::new(200).set_body_json(json!({})),
            _ => auth_rejection(404, json!({ "msg": "Not found" })),
        }
    }
}

impl Store {
    fn user_for(&self, token: &str) -> Option<&FakeUser> {
        let id = self.tokens.get(token)?;
        self.users.iter().find(|user| user.id == *id)
    }

    fn issue_session(&mut self, id: Uuid) -> ResponseTemplate {
        let access_token = format!("at-{}", Uuid::new_v4());
        let refresh_token = format!("rt-{}", Uuid::new_v4());
        self.tokens.insert(access_token.clone(), id);
        self.tokens.insert(refresh_token.clone(), id);

        let Some(user) = self.users.iter().find(|user| user.id == id) else {
            return auth_rejection(404, json!({ "msg": "User not found" }));
        };
        ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access_token,
            "refresh_token": refresh_token,
            "token_type": "bearer",
            "expires_in": TOKEN_LIFETIME_SECS,
            "expires_at": Utc::now().timestamp() + TOKEN_LIFETIME_SECS,
            "user": user.to_json(),
        }))
    }
}

fn auth_rejection(status: u16, body: Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_key_names() {
        assert_eq!(foreign_key("categories"), "category_id");
        assert_eq!(foreign_key("products"), "product_id");
        assert_eq!(foreign_key("order_items"), "order_item_id");
        assert_eq!(foreign_key("orders"), "order_id");
    }

    #[test]
    fn test_split_top_level_keeps_nested_selects() {
        let parts = split_top_level("*,items:order_items(*,product:products(id,name))");
        assert_eq!(parts, vec!["*", "items:order_items(*,product:products(id,name))"]);
    }

    #[test]
    fn test_filters() {
        let row = json!({ "name": "Honeycrisp Apples", "stock_quantity": 4, "user_id": null });
        assert!(matches_filter(&row, &row, "name", "ilike.%apple%"));
        assert!(matches_filter(&row, &row, "stock_quantity", "lte.10"));
        assert!(matches_filter(&row, &row, "user_id", "is.null"));
        assert!(!matches_filter(&row, &row, "stock_quantity", "eq.5"));
    }
}
