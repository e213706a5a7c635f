use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use roster_core::Role;
use roster_models::{
    Class, ClassListResponse, CreateClassDto, Member, MemberListResponse, SetRoleDto,
    UpdateClassDto,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::classes::controller::list_classes,
        crate::modules::classes::controller::create_class,
        crate::modules::classes::controller::get_class,
        crate::modules::classes::controller::update_class,
        crate::modules::classes::controller::delete_class,
        crate::modules::members::controller::list_members,
        crate::modules::members::controller::join_class,
        crate::modules::members::controller::leave_class,
        crate::modules::members::controller::remove_member,
        crate::modules::members::controller::set_role,
    ),
    components(
        schemas(
            Class,
            ClassListResponse,
            CreateClassDto,
            UpdateClassDto,
            Member,
            MemberListResponse,
            SetRoleDto,
            Role,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Classes", description = "Class lifecycle: create, read, update, deactivate"),
        (name = "Members", description = "Enrollment, removal and role changes")
    ),
    info(
        title = "Roster API",
        version = "0.1.0",
        description = "Class and membership management with an owner, administrator and student role hierarchy.",
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        for expected in [
            "/api/classes",
            "/api/classes/{class_id}",
            "/api/classes/{class_id}/members",
            "/api/classes/{class_id}/members/{user_id}",
            "/api/classes/{class_id}/join",
            "/api/classes/{class_id}/leave",
            "/api/classes/{class_id}/leave/{user_id}",
        ] {
            assert!(paths.iter().any(|p| p == expected), "missing {expected}");
        }
    }
}
