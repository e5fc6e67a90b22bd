//! The crawl: profiles, then memberships, then engagement in the first groups.

use color_eyre::{eyre::eyre, Result};
use std::io::Write;
use tracing::{info, warn};

use crate::activity::ActivityAggregator;
use crate::config::HarvestConfig;
use crate::export::Exporter;
use crate::vk::CachedVkClient;

/// What a run wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestSummary {
  pub users: usize,
  pub groups: usize,
  pub activity_records: usize,
  pub audio_tracks: usize,
}

pub struct Harvester {
  client: CachedVkClient,
  aggregator: ActivityAggregator<CachedVkClient>,
  config: HarvestConfig,
}

impl Harvester {
  pub fn new(client: CachedVkClient, config: HarvestConfig) -> Self {
    Self {
      aggregator: ActivityAggregator::new(client.clone()),
      client,
      config,
    }
  }

  /// Crawl every configured user and write the results to `exporter`.
  ///
  /// Fetch failures only shrink the output. Errors returned here come from
  /// writing the export.
  pub async fn run<W: Write>(&self, exporter: &mut Exporter<W>) -> Result<HarvestSummary> {
    let user_ids: Vec<String> = self
      .config
      .user_ids
      .iter()
      .map(|id| id.trim().to_string())
      .filter(|id| !id.is_empty())
      .collect();
    if user_ids.is_empty() {
      return Err(eyre!(
        "No user ids to harvest. Pass --user or set harvest.user_ids in the config file."
      ));
    }

    let mut summary = HarvestSummary::default();

    let Some(users) = self.client.get_users(&user_ids).await else {
      warn!(?user_ids, "users.get returned nothing, nothing to harvest");
      return Ok(summary);
    };

    for user in &users {
      info!(user_id = user.id, name = %user.full_name(), "harvesting user");
      exporter.write_user(user)?;
      summary.users += 1;

      if self.config.fetch_audio {
        let tracks = self.client.get_user_audio(user.id).await.unwrap_or_default();
        for track in &tracks {
          exporter.write_audio(user.id, track)?;
        }
        summary.audio_tracks += tracks.len();
      }

      let Some(groups) = self.client.get_user_groups(user.id).await else {
        warn!(user_id = user.id, "no groups fetched for user");
        continue;
      };

      for (i, group) in groups.iter().enumerate() {
        info!(index = i, group_id = group.id, group_name = %group.name, "group");
        exporter.write_group(user.id, group)?;
        summary.groups += 1;

        if i >= self.config.group_limit {
          continue;
        }

        let Some(posts) = self.client.get_posts(group.id).await else {
          warn!(group_id = group.id, "no posts fetched for group");
          continue;
        };

        let records = self.aggregator.aggregate(group.id, user.id, &posts).await;
        for record in &records {
          exporter.write_activity(record)?;
        }
        summary.activity_records += records.len();
      }
    }

    let [posts, likes, comments] = self.client.cache_stats();
    info!(
      users = summary.users,
      groups = summary.groups,
      activity_records = summary.activity_records,
      posts_cache_hits = posts.hits,
      likes_cache_hits = likes.hits,
      comments_cache_hits = comments.hits,
      "harvest finished"
    );

    Ok(summary)
  }
}
