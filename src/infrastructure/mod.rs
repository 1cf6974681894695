pub mod gemini_http;

pub use gemini_http::GeminiHttp;
