pub mod static_proxy;
