//! Permission ids that gate the administrative surface.

pub const DEFINE_SERVICE: &str = "define_service";
pub const DEFINE_PERMISSION: &str = "define_permission";
pub const DEFINE_ROLE: &str = "define_role";
pub const CREATE_USER: &str = "create_user";
pub const ADD_ENTITLEMENT: &str = "add_entitlement";
pub const ADD_ENTITLEMENT_TO_USER: &str = "add_entitlement_to_user";
pub const ADD_CREDENTIAL_TO_USER: &str = "add_credential_to_user";
pub const CREATE_COLLECTION: &str = "create_collection";
pub const ADD_CONTENT: &str = "add_content";
pub const CREATE_PRODUCT: &str = "create_product";
pub const CREATE_COUNTRY: &str = "create_country";
pub const CREATE_DEVICE: &str = "create_device";

pub const ALL: [&str; 12] = [
    DEFINE_SERVICE,
    DEFINE_PERMISSION,
    DEFINE_ROLE,
    CREATE_USER,
    ADD_ENTITLEMENT,
    ADD_ENTITLEMENT_TO_USER,
    ADD_CREDENTIAL_TO_USER,
    CREATE_COLLECTION,
    ADD_CONTENT,
    CREATE_PRODUCT,
    CREATE_COUNTRY,
    CREATE_DEVICE,
];
