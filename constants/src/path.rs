/// Catalog location relative to the asset root.
pub const CATALOG_PATH: &str = "data/tools.catalog.json";

/// Extension registered with the JSON asset loader for catalogs.
pub const CATALOG_EXTENSION: &str = "catalog.json";

/// Canvas selector the web build renders into.
pub const CANVAS_SELECTOR: &str = "#bevy";
