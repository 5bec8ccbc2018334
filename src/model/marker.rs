// Region markers - loop points, tempo changes, text labels

/// Marker discriminant, stable across persistence
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum MarkerKind {
    Loop = 1,
    Tempo = 2,
    Text = 3,
}

/// Loop playback range
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LoopMarker {
    /// Loop start in beats
    pub start_beat: f64,
    /// Loop end in beats
    pub beat: f64,
}

/// Tempo and time signature change
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TempoMarker {
    pub beat: f64,
    pub tempo: f64,
    pub tsig_num: u8,
    pub tsig_den: u8,
}

/// Free-text label
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextMarker {
    pub beat: f64,
    pub text: String,
}

/// A marker on the region timeline
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Marker {
    Loop(LoopMarker),
    Tempo(TempoMarker),
    Text(TextMarker),
}

impl Marker {
    /// Position of the marker on the timeline.
    /// For loop markers this is the loop end, matching where the marker
    /// head is drawn.
    pub fn beat(&self) -> f64 {
        match self {
            Marker::Loop(m) => m.beat,
            Marker::Tempo(m) => m.beat,
            Marker::Text(m) => m.beat,
        }
    }

    pub fn kind(&self) -> MarkerKind {
        match self {
            Marker::Loop(_) => MarkerKind::Loop,
            Marker::Tempo(_) => MarkerKind::Tempo,
            Marker::Text(_) => MarkerKind::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_accessors() {
        let tempo = Marker::Tempo(TempoMarker {
            beat: 8.0,
            tempo: 140.0,
            tsig_num: 3,
            tsig_den: 4,
        });
        assert_eq!(tempo.beat(), 8.0);
        assert_eq!(tempo.kind(), MarkerKind::Tempo);

        let text = Marker::Text(TextMarker {
            beat: 4.0,
            text: "verse".to_string(),
        });
        assert_eq!(text.kind(), MarkerKind::Text);

        let lp = Marker::Loop(LoopMarker {
            start_beat: 0.0,
            beat: 16.0,
        });
        assert_eq!(lp.beat(), 16.0);
        assert_eq!(lp.kind(), MarkerKind::Loop);
    }
}
