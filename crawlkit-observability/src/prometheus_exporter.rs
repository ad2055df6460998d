use prometheus::{Encoder, TextEncoder};

/// Render prometheus text exposition format from a registry.
pub fn render_metrics(registry: &prometheus::Registry) -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %err, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{IntCounterVec, Opts, Registry};

    #[test]
    fn render_empty_registry_returns_empty_string() {
        let output = render_metrics(&Registry::new());
        assert!(output.is_empty(), "Empty registry should produce no output, got: {output:?}");
    }

    #[test]
    fn render_labelled_counter() {
        let registry = Registry::new();
        let counter = IntCounterVec::new(
            Opts::new("plugin_calls_total", "Plugin calls"),
            &["capability"],
        )
        .unwrap();
        registry.register(Box::new(counter.clone())).unwrap();
        counter.with_label_values(&["on_new_state"]).inc_by(3);

        let output = render_metrics(&registry);
        assert!(output.contains("# TYPE plugin_calls_total counter"));
        assert!(output.contains(r#"plugin_calls_total{capability="on_new_state"} 3"#));
    }
}
