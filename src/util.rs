use crate::analyzer::Analysis;
use crate::model::percussion::percussion_name;
use std::path::Path;

const MIDI_EXTENSION: &str = ".mid";

/// The last component of `path`, e.g. `songs/ACDC - BackInBlack.mid` -> `ACDC - BackInBlack.mid`.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Builds a readable track name from a MIDI file name.
///
/// CamelCase words are split apart, underscores become spaces and the `.mid`
/// extension is dropped, so `ACDC - BackInBlack.mid` becomes `ACDC - Back In Black`.
/// Takes a bare file name, as returned by [`file_name_of`].
pub fn derive_track_name(file_name: &str) -> String {
    let mut spaced = String::with_capacity(file_name.len() + 8);
    let mut prev: Option<char> = None;
    for c in file_name.chars() {
        if prev.is_some_and(|p| p.is_ascii_lowercase()) && c.is_ascii_uppercase() {
            spaced.push(' ');
        }
        spaced.push(if c == '_' { ' ' } else { c });
        prev = Some(c);
    }

    let stripped = spaced.replace(MIDI_EXTENSION, "");

    let mut name = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        if c == ' ' && name.ends_with(' ') {
            continue;
        }
        name.push(c);
    }

    name.trim().to_string()
}

/// One line per drum seen, most frequent first, e.g. `Bass Drum 1 (36):            12`.
pub fn drum_summary(analysis: &Analysis) -> Vec<String> {
    analysis
        .drums_by_count()
        .into_iter()
        .map(|(pitch, count)| {
            let label = format!("{} ({}):", percussion_name(pitch).unwrap_or("Unknown"), pitch);
            format!("{:<30}{:>3}", label, count)
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    #[rstest]
    #[case("ACDC - BackInBlack.mid", "ACDC - Back In Black")]
    #[case("my_song_file.mid", "my song file")]
    #[case("plainsong.mid", "plainsong")]
    #[case("Plain Song.mid", "Plain Song")]
    #[case("__Leading__Trailing__.mid", "Leading Trailing")]
    #[case("Snake_Case_Song.mid", "Snake Case Song")]
    #[case("aBcDeF", "a Bc De F")]
    #[case("SONG.MID", "SONG.MID")]
    #[case("intro.mid_outro.mid", "intro outro")]
    fn track_names(#[case] file_name: &str, #[case] expect: &str) {
        assert_eq!(derive_track_name(file_name), expect);
    }

    #[test]
    fn file_names() {
        assert_eq!(file_name_of(&PathBuf::from("a/b/Song.mid")), "Song.mid");
        assert_eq!(file_name_of(&PathBuf::from("Song.mid")), "Song.mid");
        assert_eq!(
            derive_track_name(&file_name_of(&PathBuf::from("../midi/ACDC - BackInBlack.mid"))),
            "ACDC - Back In Black"
        );
    }

    #[test]
    fn summary_lines() {
        let analysis = Analysis {
            max_tempo_bpm: Some(120),
            has_drum_notes: true,
            drum_counts: BTreeMap::from([(36, 12), (42, 40), (20, 1)]),
        };

        let lines = drum_summary(&analysis);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], format!("{:<30}{:>3}", "Closed Hi Hat (42):", 40));
        assert_eq!(lines[1], format!("{:<30}{:>3}", "Bass Drum 1 (36):", 12));
        assert_eq!(lines[1].len(), 33);
        assert!(lines[2].starts_with("Unknown (20):"));
    }
}
