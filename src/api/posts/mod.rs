pub mod functions;
pub mod handlers;
pub mod structures;

pub use handlers::{
    __path_create_post, __path_delete_post, __path_get_post, __path_get_post_by_slug,
    __path_list_posts, __path_search_posts, __path_update_post, create_post, delete_post,
    get_post, get_post_by_slug, init_routes, list_posts, search_posts, update_post,
};

pub use structures::{
    CreatePostRequest, MessageResponse, PostListQuery, PostSearchQuery, PostView,
    UpdatePostRequest,
};

pub use functions::generate_slug;
