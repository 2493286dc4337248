use morpher_image::{Image, ImageDtype, ImageSize};

use crate::config::MorphConfig;
use crate::correspondence::{CorrespondenceSet, Side};
use crate::error::{MorphError, ValidationError};
use crate::feature::Feature;

/// Everything needed to render a morph between two images.
///
/// A session is an explicit value: it owns both source images, the
/// correspondence set and the configuration, and is only read during
/// generation. Independent sessions can be rendered concurrently.
#[derive(Debug, Clone)]
pub struct MorphSession<T, const C: usize> {
    source: Image<T, C>,
    destination: Image<T, C>,
    correspondences: CorrespondenceSet,
    config: MorphConfig,
}

impl<T: ImageDtype, const C: usize> MorphSession<T, C> {
    /// Create a new session.
    ///
    /// The output size is the shared size of both images. Feature
    /// coordinates are clamped into the image before use.
    ///
    /// # Arguments
    ///
    /// * `source` - Image A, shown at t = 0.
    /// * `destination` - Image B, shown at t = 1.
    /// * `correspondences` - The matching features of A and B.
    /// * `config` - The engine parameters.
    ///
    /// # Errors
    ///
    /// * [`ValidationError::InvalidConfig`] if the configuration is out of range.
    /// * [`ValidationError::ImageSizeMismatch`] if the images differ in size.
    /// * [`ValidationError::EmptyImage`] if the images have no pixels.
    /// * [`ValidationError::DegenerateSegment`] if clamping collapses a segment.
    pub fn new(
        source: Image<T, C>,
        destination: Image<T, C>,
        correspondences: CorrespondenceSet,
        config: MorphConfig,
    ) -> Result<Self, MorphError> {
        config.validate()?;

        if source.size() != destination.size() {
            return Err(
                ValidationError::ImageSizeMismatch(source.size(), destination.size()).into(),
            );
        }

        let correspondences = correspondences.clamped_to(source.size())?;

        log::info!(
            "morph session: {} with {} correspondences",
            source.size(),
            correspondences.len()
        );

        Ok(Self {
            source,
            destination,
            correspondences,
            config,
        })
    }

    /// Create a session straight from the two feature sequences.
    ///
    /// # Errors
    ///
    /// Any error of [`CorrespondenceSet::new`] or [`MorphSession::new`].
    pub fn from_features(
        source: Image<T, C>,
        destination: Image<T, C>,
        source_features: Vec<Feature>,
        destination_features: Vec<Feature>,
        config: MorphConfig,
    ) -> Result<Self, MorphError> {
        let correspondences = CorrespondenceSet::new(source_features, destination_features)?;
        Self::new(source, destination, correspondences, config)
    }

    /// The size of every rendered frame.
    pub fn size(&self) -> ImageSize {
        self.source.size()
    }

    /// Image A.
    pub fn source(&self) -> &Image<T, C> {
        &self.source
    }

    /// Image B.
    pub fn destination(&self) -> &Image<T, C> {
        &self.destination
    }

    /// The image on the given side.
    pub fn image(&self, side: Side) -> &Image<T, C> {
        match side {
            Side::Source => &self.source,
            Side::Destination => &self.destination,
        }
    }

    /// The clamped correspondence set.
    pub fn correspondences(&self) -> &CorrespondenceSet {
        &self.correspondences
    }

    /// The engine parameters.
    pub fn config(&self) -> &MorphConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Point2;
    use crate::Correspondence;

    fn image(width: usize, height: usize) -> Result<Image<u8, 4>, MorphError> {
        Ok(Image::from_size_val([width, height].into(), 0)?)
    }

    #[test]
    fn session_smoke() -> Result<(), MorphError> {
        let session = MorphSession::from_features(
            image(4, 3)?,
            image(4, 3)?,
            vec![Feature::point(10.0, -1.0)],
            vec![Feature::point(1.0, 1.0)],
            MorphConfig::default(),
        )?;
        assert_eq!(session.size(), [4, 3].into());
        assert_eq!(
            session.correspondences().pairs()[0],
            Correspondence::Point(Point2::new(3.0, 0.0), Point2::new(1.0, 1.0))
        );
        Ok(())
    }

    #[test]
    fn session_size_mismatch() -> Result<(), MorphError> {
        let res = MorphSession::from_features(
            image(4, 3)?,
            image(3, 4)?,
            vec![Feature::point(0.0, 0.0)],
            vec![Feature::point(0.0, 0.0)],
            MorphConfig::default(),
        );
        assert!(matches!(
            res,
            Err(MorphError::Validation(ValidationError::ImageSizeMismatch(..)))
        ));
        Ok(())
    }

    #[test]
    fn session_empty_image() -> Result<(), MorphError> {
        let res = MorphSession::from_features(
            image(0, 0)?,
            image(0, 0)?,
            vec![Feature::point(0.0, 0.0)],
            vec![Feature::point(0.0, 0.0)],
            MorphConfig::default(),
        );
        assert!(matches!(
            res,
            Err(MorphError::Validation(ValidationError::EmptyImage))
        ));
        Ok(())
    }

    #[test]
    fn session_invalid_config() -> Result<(), MorphError> {
        let res = MorphSession::from_features(
            image(2, 2)?,
            image(2, 2)?,
            vec![Feature::point(0.0, 0.0)],
            vec![Feature::point(0.0, 0.0)],
            MorphConfig::default().with_a(-1.0),
        );
        assert!(matches!(
            res,
            Err(MorphError::Validation(ValidationError::InvalidConfig(_)))
        ));
        Ok(())
    }
}
