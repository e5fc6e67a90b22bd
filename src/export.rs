//! CSV export of harvested profiles, memberships and engagement.

use color_eyre::{eyre::eyre, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::vk::types::{ActivityRecord, AudioTrack, Group, UserProfile};

pub const USERS_FILE: &str = "users_info.csv";
pub const ACTIVITY_FILE: &str = "user_activity.csv";
pub const GROUPS_FILE: &str = "groups_info.csv";
pub const AUDIO_FILE: &str = "user_audio.csv";

/// Placeholder for profile fields the API did not return
pub const NOT_SPECIFIED: &str = "Not specified";

const USER_HEADER: [&str; 21] = [
  "ID",
  "Name",
  "Page",
  "Birth date",
  "Sex",
  "City",
  "Country",
  "Home town",
  "Contacts",
  "Site",
  "Status",
  "Occupation",
  "Activities",
  "Interests",
  "Music",
  "Movies",
  "TV",
  "Books",
  "Games",
  "About",
  "Quotes",
];

const ACTIVITY_HEADER: [&str; 7] = [
  "user_id",
  "group_id",
  "post_id",
  "dt",
  "comment",
  "is_like",
  "post_text",
];

const GROUP_HEADER: [&str; 5] = ["User ID", "Group ID", "Group name", "Type", "Description"];

const AUDIO_HEADER: [&str; 5] = ["user_id", "audio_id", "artist", "title", "duration"];

/// Writes the export files. Each file gets its header row on creation.
pub struct Exporter<W: Write> {
  users: csv::Writer<W>,
  activity: csv::Writer<W>,
  groups: csv::Writer<W>,
  audio: Option<csv::Writer<W>>,
}

impl Exporter<File> {
  /// Create (truncating) the export files in `dir`.
  pub fn create(dir: &Path, with_audio: bool) -> Result<Self> {
    std::fs::create_dir_all(dir)
      .map_err(|e| eyre!("Failed to create output directory {}: {}", dir.display(), e))?;

    let open = |name: &str| -> Result<File> {
      let path: PathBuf = dir.join(name);
      File::create(&path).map_err(|e| eyre!("Failed to create {}: {}", path.display(), e))
    };

    let audio = if with_audio {
      Some(open(AUDIO_FILE)?)
    } else {
      None
    };

    Self::from_writers(open(USERS_FILE)?, open(ACTIVITY_FILE)?, open(GROUPS_FILE)?, audio)
  }
}

impl<W: Write> Exporter<W> {
  pub fn from_writers(users: W, activity: W, groups: W, audio: Option<W>) -> Result<Self> {
    let mut exporter = Self {
      users: csv::Writer::from_writer(users),
      activity: csv::Writer::from_writer(activity),
      groups: csv::Writer::from_writer(groups),
      audio: audio.map(csv::Writer::from_writer),
    };

    exporter.users.write_record(USER_HEADER)?;
    exporter.activity.write_record(ACTIVITY_HEADER)?;
    exporter.groups.write_record(GROUP_HEADER)?;
    if let Some(audio) = exporter.audio.as_mut() {
      audio.write_record(AUDIO_HEADER)?;
    }

    Ok(exporter)
  }

  pub fn write_user(&mut self, user: &UserProfile) -> Result<()> {
    self.users.write_record(user_row(user))?;
    Ok(())
  }

  pub fn write_activity(&mut self, record: &ActivityRecord) -> Result<()> {
    self.activity.write_record(activity_row(record))?;
    Ok(())
  }

  pub fn write_group(&mut self, user_id: i64, group: &Group) -> Result<()> {
    self.groups.write_record([
      user_id.to_string(),
      group.id.to_string(),
      group.name.clone(),
      group.kind.clone().unwrap_or_default(),
      group.description.clone().unwrap_or_default(),
    ])?;
    Ok(())
  }

  /// No-op when the exporter was created without an audio file.
  pub fn write_audio(&mut self, user_id: i64, track: &AudioTrack) -> Result<()> {
    if let Some(audio) = self.audio.as_mut() {
      audio.write_record([
        user_id.to_string(),
        track.id.to_string(),
        track.artist.clone(),
        track.title.clone(),
        track.duration.to_string(),
      ])?;
    }
    Ok(())
  }

  pub fn flush(&mut self) -> Result<()> {
    self.users.flush()?;
    self.activity.flush()?;
    self.groups.flush()?;
    if let Some(audio) = self.audio.as_mut() {
      audio.flush()?;
    }
    Ok(())
  }
}

fn or_placeholder(value: &Option<String>) -> String {
  value.clone().unwrap_or_else(|| NOT_SPECIFIED.to_string())
}

fn user_row(user: &UserProfile) -> Vec<String> {
  let page = if user.is_closed { "Closed" } else { "Open" };
  let sex = match user.sex {
    Some(1) => "Female",
    Some(2) => "Male",
    _ => NOT_SPECIFIED,
  };
  let contacts = format!(
    "{}, {}",
    or_placeholder(&user.mobile_phone),
    or_placeholder(&user.home_phone)
  );

  vec![
    user.id.to_string(),
    user.full_name(),
    page.to_string(),
    or_placeholder(&user.bdate),
    sex.to_string(),
    or_placeholder(&user.city),
    or_placeholder(&user.country),
    or_placeholder(&user.home_town),
    contacts,
    or_placeholder(&user.site),
    or_placeholder(&user.status),
    or_placeholder(&user.occupation),
    or_placeholder(&user.activities),
    or_placeholder(&user.interests),
    or_placeholder(&user.music),
    or_placeholder(&user.movies),
    or_placeholder(&user.tv),
    or_placeholder(&user.books),
    or_placeholder(&user.games),
    or_placeholder(&user.about),
    or_placeholder(&user.quotes),
  ]
}

fn activity_row(record: &ActivityRecord) -> Vec<String> {
  let dt = record
    .published_at()
    .map(|dt| dt.to_rfc3339())
    .unwrap_or_else(|| record.date.to_string());

  vec![
    record.user_id.to_string(),
    record.group_id.to_string(),
    record.post_id.to_string(),
    dt,
    record.comment.clone().unwrap_or_default(),
    record.liked.to_string(),
    record.post_text.clone(),
  ]
}
