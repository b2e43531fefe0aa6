//! Plotly figure JSON for the graphs page.

use serde_json::{json, Value};

/// A single Plotly figure: traces plus a titled layout.
#[derive(Debug, Clone)]
pub struct Chart {
    pub id: String,
    title: String,
    traces: Vec<Value>,
}

impl Chart {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            traces: Vec::new(),
        }
    }

    pub fn bar<X: serde::Serialize, Y: serde::Serialize>(mut self, x: &[X], y: &[Y]) -> Self {
        self.traces.push(json!({ "type": "bar", "x": x, "y": y }));
        self
    }

    pub fn pie<L: serde::Serialize, V: serde::Serialize>(mut self, labels: &[L], values: &[V]) -> Self {
        self.traces.push(json!({
            "type": "pie",
            "labels": labels,
            "values": values,
            "textposition": "inside"
        }));
        self
    }

    pub fn build(&self) -> Value {
        json!({
            "data": self.traces,
            "layout": { "title": { "text": self.title } }
        })
    }

    /// Figure JSON safe to inline inside a `<script>` element.
    pub fn to_script_json(&self) -> String {
        self.build().to_string().replace("</", "<\\/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_chart_shape() {
        let chart = Chart::new("years", "Distribution of Voters by Birth Year").bar(&[1950, 1951], &[3, 4]);
        let v = chart.build();
        assert_eq!(v["data"][0]["type"], "bar");
        assert_eq!(v["data"][0]["x"], json!([1950, 1951]));
        assert_eq!(v["layout"]["title"]["text"], "Distribution of Voters by Birth Year");
    }

    #[test]
    fn pie_labels_cannot_close_the_script_tag() {
        let chart = Chart::new("party", "Parties").pie(&["</script><b>"], &[1]);
        let out = chart.to_script_json();
        assert!(!out.contains("</script>"));
        assert!(out.contains("<\\/script>"));
    }
}
