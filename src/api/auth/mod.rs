pub mod functions;
pub mod handlers;
pub mod structures;

pub use handlers::{
    __path_current_session, __path_register, __path_sign_in, __path_sign_out, current_session,
    init_routes, register, sign_in, sign_out,
};

pub use structures::{RegisterRequest, SessionResponse, SignInRequest};
