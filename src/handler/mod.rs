/*
 * Responsibility
 * - 1 リクエストの流れ: gate (認可) → endpoint → dispatcher (レスポンス生成)
 * - endpoint から見える RequestContext と JSON body の decode
 */
pub mod body;
pub mod context;
pub mod gate;
pub mod request;
pub mod response;

pub use body::decode_json_body;
pub use context::{Reply, RequestContext, ResponseKind};
pub use gate::{Admission, Requirement};
pub use request::{Endpoint, RequestHandler, handle};
