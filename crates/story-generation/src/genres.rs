// genres.rs
//! Tablas por género usadas para completar valores por defecto.

/// Valores por defecto asociados a un género.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenreProfile {
  pub key: &'static str,
  pub theme: &'static str,
  pub setting: &'static str,
  pub conflict: &'static str,
  pub moral_lesson: &'static str,
  pub atmosphere: &'static str,
  /// Detalles sensoriales para describir el escenario.
  pub sensory: &'static str,
}

const GENRES: &[GenreProfile] = &[
  GenreProfile { key: "fantasy",
                 theme: "Magic and Friendship",
                 setting: "Enchanted Forest",
                 conflict: "Must break a spell that has put the forest to sleep",
                 moral_lesson: "Kindness is the strongest kind of magic",
                 atmosphere: "magical",
                 sensory: "glowing mushrooms, whispering leaves and the scent of wild berries" },
  GenreProfile { key: "adventure",
                 theme: "Courage and Discovery",
                 setting: "Hidden Island",
                 conflict: "Must find the missing map before the tide comes in",
                 moral_lesson: "Being brave means trying even when you feel afraid",
                 atmosphere: "exciting",
                 sensory: "crashing waves, warm sand and the cry of seagulls" },
  GenreProfile { key: "space",
                 theme: "Exploration and Science",
                 setting: "Distant Galaxy",
                 conflict: "Must return home from a distant planet",
                 moral_lesson: "Curiosity and teamwork help us find our way",
                 atmosphere: "wondrous",
                 sensory: "twinkling starlight, the hum of the spaceship engine and the cool silence of space" },
  GenreProfile { key: "mystery",
                 theme: "Curiosity and Problem Solving",
                 setting: "Old Lighthouse Town",
                 conflict: "Must solve the puzzle of the vanishing lanterns",
                 moral_lesson: "Asking good questions leads to the truth",
                 atmosphere: "mysterious",
                 sensory: "creaking floorboards, foggy streets and the distant ring of a bell" },
  GenreProfile { key: "animals",
                 theme: "Nature and Caring",
                 setting: "Sunny Meadow",
                 conflict: "Must help a lost animal friend find its family",
                 moral_lesson: "Every creature deserves care and respect",
                 atmosphere: "warm",
                 sensory: "buzzing bees, soft grass and the smell of wildflowers" },
  GenreProfile { key: "ocean",
                 theme: "Protecting the Sea",
                 setting: "Coral Reef Kingdom",
                 conflict: "Must clean up the reef before the great sea festival",
                 moral_lesson: "Small actions can protect big places",
                 atmosphere: "shimmering",
                 sensory: "bubbling currents, colorful coral and gentle whale songs" },
  GenreProfile { key: "friendship",
                 theme: "Friendship and Sharing",
                 setting: "Cozy Neighborhood",
                 conflict: "Must make things right after a big misunderstanding",
                 moral_lesson: "Good friends listen and forgive",
                 atmosphere: "cheerful",
                 sensory: "laughter in the park, warm cookies and bright kites in the sky" },
];

const FALLBACK: GenreProfile = GenreProfile { key: "general",
                                              theme: "Friendship and Courage",
                                              setting: "Magical Land",
                                              conflict: "Must overcome a challenge to help their friends",
                                              moral_lesson: "Believing in yourself makes anything possible",
                                              atmosphere: "whimsical",
                                              sensory: "bright colors, gentle breezes and happy sounds" };

/// Perfil del género (sin distinguir mayúsculas). Los géneros desconocidos
/// reciben un perfil genérico.
pub fn genre_profile(genre: &str) -> &'static GenreProfile {
  let key = genre.trim().to_lowercase();
  GENRES.iter().find(|g| g.key == key).unwrap_or(&FALLBACK)
}

pub fn known_genres() -> impl Iterator<Item = &'static str> {
  GENRES.iter().map(|g| g.key)
}
