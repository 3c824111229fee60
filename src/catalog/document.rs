use super::{Catalog, CatalogItem};

/// Text that represents an item in the vector space: genre, overview,
/// director and both leads, joined by single spaces in that order.
/// Empty fields keep their slot, so an empty genre still yields a leading space.
pub fn build_document(item: &CatalogItem) -> String {
    [
        item.genre.as_str(),
        item.overview.as_str(),
        item.director.as_str(),
        item.star1.as_str(),
        item.star2.as_str(),
    ]
    .join(" ")
}

/// One document per catalog row, same order.
pub fn build_documents(catalog: &Catalog) -> Vec<String> {
    catalog.items().iter().map(build_document).collect()
}
