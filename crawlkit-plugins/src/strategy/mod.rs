pub mod normalized_dom;
