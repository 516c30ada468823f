use admkit_audio::AudioError;
use admkit_document::DocumentError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no ADM document attached")]
    NoDocument,
    #[error("no audio source attached")]
    NoAudio,
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Audio(#[from] AudioError),
}
