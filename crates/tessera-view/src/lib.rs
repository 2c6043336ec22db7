//! # tessera-view
//!
//! One render contract over several template engines, with template paths
//! derived from the project layout and request-scoped variables merged into
//! every render.
//!
//! ## Features
//!
//! - **Four engines**: a built-in raw interpolator, Tera, MiniJinja and
//!   Handlebars, selected per plugin with `view.handler`
//! - **Conventional paths**: `{root}[/plugin/{plugin}]/app[/{app}]/view/{template}.{suffix}`
//! - **Request variables**: values assigned during a request reach every template
//! - **Template inference**: `UserController::profile` renders `user/profile`
//! - **Engine caching**: one engine per view root, built on first use
//! - **Response types**: [`View`] and helpers producing `http::Response`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tessera_view::{view, ConfigStore, RenderRequest, RequestContext, Views};
//!
//! let views = Views::builder("/srv/project")
//!     .config(ConfigStore::from_toml_str(r#"
//!         [view]
//!         handler = "tera"
//!     "#)?)
//!     .build();
//!
//! // Per request
//! let mut ctx = RequestContext::new()
//!     .with_app("shop")
//!     .with_controller("app::shop::controller::CartController", "index");
//! ctx.assign("user", "alice");
//!
//! // Renders /srv/project/app/shop/view/cart/index.html
//! let response = view(&views, &ctx, RenderRequest::inferred().var("items", 3))?;
//! # Ok::<(), tessera_view::ViewError>(())
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
mod context;
mod error;
pub mod inference;
mod path;
pub mod render;
mod request;
mod response;
mod vars;
mod views;

pub use config::{ConfigStore, ViewOptions};
pub use context::RequestContext;
pub use error::{Result, ViewError};
pub use inference::{infer_from_handler, infer_template};
pub use path::PathResolver;
pub use render::{
    EngineCache, EngineHandle, EngineKind, ExtensionFn, ExtensionRegistry, HandlebarsRender,
    MiniJinjaRender, RawRender, RenderAdapter, TeraRender, ViewEnv,
};
pub use request::{RenderDescriptor, RenderRequest};
pub use response::{
    handlebars_view, minijinja_view, raw_view, response_view, system_status, system_template,
    tera_view, view, Response, View,
};
pub use vars::{merge_vars, to_vars, Vars, VarsBuilder};
pub use views::{Views, ViewsBuilder};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        view, ConfigStore, EngineKind, RenderDescriptor, RenderRequest, RequestContext, View,
        ViewError, Views, Vars, VarsBuilder,
    };
}
