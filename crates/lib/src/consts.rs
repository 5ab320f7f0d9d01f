/// Method invoked when the caller does not name one.
pub const DEFAULT_ENTRY_METHOD: &str = "Main";

/// Build configuration used when none is configured.
pub const DEFAULT_CONFIGURATION: &str = "release";

/// Directory under the project directory that receives build output.
pub const BIN_DIR: &str = "bin";

/// Final directory of the build output layout holding the artifacts.
pub const PUBLISH_DIR: &str = "publish";

/// File extension appended to the artifact name.
pub const ARTIFACT_EXTENSION: &str = "lua";

/// Name of the table on a type that holds its instance methods.
pub const PROTOTYPE_FIELD: &str = "prototype";

/// Name of the zero-argument constructor used for the instance form.
pub const CONSTRUCTOR_FIELD: &str = "new";

/// Name of the global table exposed to artifacts.
pub const HOST_GLOBAL: &str = "host";
