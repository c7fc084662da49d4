// passd — Gateway Module
//
// Unix Domain Socket server exposing verify/list/get/upsert/create/delete
// as JSON-RPC 2.0 to the front-end sites and the admin surface.

mod protocol;
mod uds;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use uds::UdsServer;
