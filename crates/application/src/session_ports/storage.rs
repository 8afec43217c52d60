use harvestgate_core::AppResult;

/// Storage key for the serialized session user.
pub const USER_STORAGE_KEY: &str = "harvestgate.user";
/// Storage key for the serialized role names.
pub const ROLES_STORAGE_KEY: &str = "harvestgate.roles";
/// Storage key for the serialized permission names.
pub const PERMISSIONS_STORAGE_KEY: &str = "harvestgate.permissions";
/// Storage key for the path to resume after login.
pub const CONTINUE_TO_STORAGE_KEY: &str = "harvestgate.continue_to";

/// Durable, synchronous key-value storage surviving restarts.
pub trait SessionStorage: Send + Sync {
    /// Reads a value.
    fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Writes a value.
    fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Deletes a value; deleting a missing key is not an error.
    fn remove(&self, key: &str) -> AppResult<()>;
}
