//! `GET /` (spec section 6). Grounded on `original_source/src/main.py::home`.

pub async fn health() -> &'static str {
    "Hello, world"
}
