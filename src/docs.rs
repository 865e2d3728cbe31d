use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use campus_models::{CreateUserRequest, CreateUserResponse, Role};

use crate::modules::users::controller::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(crate::modules::users::controller::create_user),
    components(schemas(CreateUserRequest, CreateUserResponse, ErrorResponse, Role)),
    modifiers(&SecurityAddon),
    tags(
        (name = "Users", description = "Account provisioning")
    ),
    info(
        title = "Campus Portal Functions",
        version = "0.1.0",
        description = "Privileged procedures of the campus portal. Table reads and writes go to the data backend directly.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
